//! Convenience re-exports for common query-set usage

// Table metadata
pub use crate::schema::{Model, TableSchema};

// Query building
pub use crate::query::{
    AggregateFunction, Combinator, FilterNode, FilterOperator, Predicate, PredicateGroup,
    QuerySet, SortOrder, UpdateSet,
};

// Stores and executors
pub use crate::executor::{PgExecutor, QueryExecutor, SqliteExecutor};
pub use crate::store::{ModelStore, SaveOutcome};

// Error types
pub use crate::errors::{FilterError, QueryError, SchemaError};
pub use crate::validation::ValidationError;

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};
