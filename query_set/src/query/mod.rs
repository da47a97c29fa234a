//! Query set construction
//!
//! Filter trees, ordering, pagination and the immutable [`QuerySet`] that
//! accumulates them, plus rendering into SQL statements.

pub mod aggregation;
pub mod builder;
pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod state;
pub mod update;

#[cfg(test)]
mod tests;

pub use aggregation::{Aggregate, AggregateFunction};
pub use builder::QuerySet;
pub use filter::{Combinator, FilterNode, FilterOperator, Predicate, PredicateGroup};
pub use ordering::{OrderClause, SortOrder};
pub use pagination::Pagination;
pub use sql_generation::{Dialect, RenderContext, SqlGenerator, SqlStatement};
pub use state::{Projection, QueryState};
pub use update::UpdateSet;
