//! # QueryHaus
//!
//! Immutable, schema-checked query sets for PostgreSQL and SQLite with exact
//! parameterized SQL rendering.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queryhaus::prelude::*;
//!
//! #[model]
//! #[table(name = "person")]
//! pub struct Person {
//!     #[primary_key]
//!     pub id: i64,
//!     pub name: String,
//!     pub email: Option<String>,
//!     pub income: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_url("sqlite::memory:");
//!
//!     let mut queryhaus = QueryHaus::connect(&config).await?;
//!     queryhaus.register::<Person>()?;
//!
//!     let rich = queryhaus
//!         .objects::<Person>()?
//!         .filter("income", ">=", Some(json!(20000)))?
//!         .order_by("name", "asc")?;
//!
//!     for person in rich.fetch().await? {
//!         println!("{} earns {}", person.name, person.income);
//!     }
//!     println!("average: {}", rich.avg("income").await?);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::{DatabasePool, QueryHaus};
pub use errors::QueryHausError;

// Re-export centralized config
pub use config::{AppConfig, Backend, ConfigError, DatabaseConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use query_set;
pub use table_derive;

// Re-export external dependencies used in public API
pub use async_trait;
pub use serde;
pub use serde_json;
pub use sqlx;
