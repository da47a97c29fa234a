use crate::validation::ValidationError;
use thiserror::Error;

/// Malformed operator/value combination in a predicate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter operation [{0}].")]
    UnknownOperation(String),

    #[error("{operation} filter requires {expected}.")]
    InvalidValue {
        operation: &'static str,
        expected: &'static str,
    },
}

/// Reference to a column that the target table does not have
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid filter: Column [{column}] does not exist in table [{table}].")]
    FilterColumn { column: String, table: String },

    #[error("Cannot order by column [{column}] because it does not exist in table [{table}].")]
    OrderColumn { column: String, table: String },

    #[error("Error forming aggregate query. Column [{column}] does not exist in table [{table}].")]
    AggregateColumn { column: String, table: String },

    #[error("Cannot select column [{column}] because it does not exist in table [{table}].")]
    ProjectionColumn { column: String, table: String },

    #[error("Cannot update column [{column}] because it does not exist in table [{table}].")]
    UpdateColumn { column: String, table: String },
}

impl SchemaError {
    /// The offending column name
    pub fn column(&self) -> &str {
        match self {
            SchemaError::FilterColumn { column, .. }
            | SchemaError::OrderColumn { column, .. }
            | SchemaError::AggregateColumn { column, .. }
            | SchemaError::ProjectionColumn { column, .. }
            | SchemaError::UpdateColumn { column, .. } => column,
        }
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query returned 0 rows. Requested a single row from [{0}].")]
    NotFound(String),

    #[error("Query returned multiple rows ({count}). Requested a single row from [{table}].")]
    MultipleResults { table: String, count: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cannot decode column [{column}] of type [{type_name}]")]
    Decode { column: String, type_name: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl QueryError {
    /// Create serialization error from a serde failure
    pub fn serialization(table: &str, error: serde_json::Error) -> Self {
        Self::Serialization(format!("Failed to map row of table '{}': {}", table, error))
    }

    /// Whether this is the zero-row failure of `single()`
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound(_))
    }
}
