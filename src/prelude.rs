//! Convenience re-exports for common QueryHaus usage
//!
//! This prelude module re-exports the most commonly used items from the QueryHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use queryhaus::prelude::*;
//!
//! let group = PredicateGroup::or([
//!     Predicate::eq("name", json!("pero")),
//!     Predicate::gt("income", json!(10000)),
//! ]);
//! assert_eq!(group.render().unwrap().0, "name = ? OR income > ?");
//! ```

// Core QueryHaus components
pub use crate::core::QueryHaus;
pub use crate::errors::QueryHausError;

// Re-export centralized config
pub use config::{AppConfig, Backend, DatabaseConfig};

// Re-export commonly used query-set types for convenience
pub use query_set::prelude::*;

// Re-export query_set module for macro-generated code
pub use query_set;

// Re-export table derive for model creation
pub use table_derive::{model, Model};

// Common external dependencies
pub use serde;
pub use sqlx;
pub use tokio;
