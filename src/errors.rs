//! Error types for the QueryHaus crate
//!
//! This module contains all error types that can be returned by QueryHaus operations.

use config::ConfigError;
use query_set::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Model not registered: {0}")]
    ModelNotRegistered(String),

    #[error("Model already registered: {0}")]
    ModelAlreadyRegistered(String),

    #[error("No database pool: the executor was injected")]
    NotConnected,
}

impl From<query_set::ValidationError> for QueryHausError {
    fn from(err: query_set::ValidationError) -> Self {
        QueryHausError::Query(err.into())
    }
}
