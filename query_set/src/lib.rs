//! Query Set - immutable, chainable queries over a single table
//!
//! This crate provides table metadata, the filter composition engine, the
//! copy-on-write [`QuerySet`] builder and the executors that run it against
//! PostgreSQL or SQLite.

pub mod errors;
pub mod executor;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod store;
pub mod validation;

pub use errors::{FilterError, QueryError, SchemaError};
pub use executor::{PgExecutor, QueryExecutor, Row, SqliteExecutor};
pub use query::{
    Aggregate, AggregateFunction, Combinator, Dialect, FilterNode, FilterOperator, OrderClause,
    Pagination, Predicate, PredicateGroup, Projection, QuerySet, QueryState, SortOrder,
    SqlGenerator, SqlStatement, UpdateSet,
};
pub use schema::{Model, TableSchema};
pub use store::{ModelStore, SaveOutcome};
pub use validation::{validate_identifier, ValidationError, MAX_IDENTIFIER_LENGTH};
