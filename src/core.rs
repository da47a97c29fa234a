//! Core QueryHaus functionality
//!
//! This module contains the main QueryHaus struct: it owns the connection
//! pool and executor and acts as the schema provider for registered models.

use query_set::{Model, ModelStore, PgExecutor, QueryExecutor, QuerySet, SqliteExecutor, TableSchema};
use sqlx::{PgPool, SqlitePool};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::QueryHausError;
use config::{Backend, DatabaseConfig};

/// Pool behind the executor
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Main QueryHaus coordinator that manages the database connection and model schemas
pub struct QueryHaus {
    pool: Option<DatabasePool>,
    executor: Arc<dyn QueryExecutor>,
    schemas: HashMap<TypeId, Arc<TableSchema>>,
}

impl std::fmt::Debug for QueryHaus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHaus")
            .field("dialect", &self.executor.dialect())
            .field("registered_tables", &self.registered_tables())
            .finish()
    }
}

impl QueryHaus {
    /// Connect to the database named by `config` and build the matching executor
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, QueryHausError> {
        config.validate()?;
        let backend = config.backend()?;
        crate::debug_log!("Connecting to {:?} database", backend);

        let idle_timeout = (config.idle_timeout_seconds > 0)
            .then(|| Duration::from_secs(config.idle_timeout_seconds));
        let max_lifetime = (config.max_lifetime_seconds > 0)
            .then(|| Duration::from_secs(config.max_lifetime_seconds));

        let (pool, executor): (DatabasePool, Arc<dyn QueryExecutor>) = match backend {
            Backend::Postgres => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(idle_timeout)
                    .max_lifetime(max_lifetime)
                    .connect(&config.url)
                    .await?;
                let executor: Arc<dyn QueryExecutor> = Arc::new(PgExecutor::new(pool.clone()));
                (DatabasePool::Postgres(pool), executor)
            }
            Backend::Sqlite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(idle_timeout)
                    .max_lifetime(max_lifetime)
                    .connect(&config.url)
                    .await?;
                let executor: Arc<dyn QueryExecutor> = Arc::new(SqliteExecutor::new(pool.clone()));
                (DatabasePool::Sqlite(pool), executor)
            }
        };

        Ok(Self {
            pool: Some(pool),
            executor,
            schemas: HashMap::new(),
        })
    }

    /// Run every query through `executor`; there is no pool to health-check
    pub fn with_executor(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            pool: None,
            executor,
            schemas: HashMap::new(),
        }
    }

    /// Get database pool reference
    pub fn pool(&self) -> Option<&DatabasePool> {
        self.pool.as_ref()
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Validate and register the schema of `M`
    pub fn register<M: Model>(&mut self) -> Result<(), QueryHausError> {
        let type_id = TypeId::of::<M>();
        if self.schemas.contains_key(&type_id) {
            return Err(QueryHausError::ModelAlreadyRegistered(
                M::table_name().to_string(),
            ));
        }

        let schema = M::schema()?;
        crate::debug_log!(
            "Registered model for table '{}' with {} columns",
            schema.table(),
            schema.columns().len()
        );
        self.schemas.insert(type_id, Arc::new(schema));
        Ok(())
    }

    /// Schema of a registered model
    pub fn schema<M: Model>(&self) -> Result<&TableSchema, QueryHausError> {
        self.shared_schema::<M>().map(|schema| schema.as_ref())
    }

    /// Fresh query set over a registered model
    pub fn objects<M: Model>(&self) -> Result<QuerySet<M>, QueryHausError> {
        let schema = self.shared_schema::<M>()?;
        Ok(QuerySet::new(Arc::clone(schema), Arc::clone(&self.executor)))
    }

    /// Store for a registered model, including primary-key lookups
    pub fn store<M: Model>(&self) -> Result<ModelStore<M>, QueryHausError> {
        let schema = self.shared_schema::<M>()?;
        Ok(ModelStore::with_schema(
            Arc::clone(schema),
            Arc::clone(&self.executor),
        ))
    }

    /// Table names of all registered models, sorted
    pub fn registered_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.schemas.values().map(|s| s.table()).collect();
        tables.sort_unstable();
        tables
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), QueryHausError> {
        match &self.pool {
            Some(DatabasePool::Postgres(pool)) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            Some(DatabasePool::Sqlite(pool)) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            None => return Err(QueryHausError::NotConnected),
        }
        crate::trace_log!("Health check passed");
        Ok(())
    }

    fn shared_schema<M: Model>(&self) -> Result<&Arc<TableSchema>, QueryHausError> {
        self.schemas
            .get(&TypeId::of::<M>())
            .ok_or_else(|| QueryHausError::ModelNotRegistered(M::table_name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use query_set::{Aggregate, Dialect, Projection, QueryError, QueryState, Row, UpdateSet};
    use serde_json::Value;

    #[derive(Debug)]
    struct EmptyExecutor;

    #[async_trait]
    impl QueryExecutor for EmptyExecutor {
        fn dialect(&self) -> Dialect {
            Dialect::Standard
        }

        async fn select(&self, _: &QueryState, _: &Projection) -> Result<Vec<Row>, QueryError> {
            Ok(Vec::new())
        }

        async fn count(&self, _: &QueryState) -> Result<u64, QueryError> {
            Ok(0)
        }

        async fn aggregate(&self, _: &QueryState, _: &Aggregate) -> Result<Value, QueryError> {
            Ok(Value::Null)
        }

        async fn update(&self, _: &QueryState, _: &UpdateSet) -> Result<u64, QueryError> {
            Ok(0)
        }

        async fn delete(&self, _: &QueryState) -> Result<u64, QueryError> {
            Ok(0)
        }

        async fn insert(&self, _: &TableSchema, _: &UpdateSet) -> Result<u64, QueryError> {
            Ok(0)
        }
    }

    #[derive(Debug, serde::Deserialize)]
    struct Invalid;

    impl Model for Invalid {
        fn table_name() -> &'static str {
            "select"
        }

        fn columns() -> &'static [&'static str] {
            &["id"]
        }
    }

    #[tokio::test]
    async fn test_injected_executor_has_no_pool() {
        let queryhaus = QueryHaus::with_executor(Arc::new(EmptyExecutor));
        assert!(queryhaus.pool().is_none());
        assert!(matches!(
            queryhaus.health_check().await,
            Err(QueryHausError::NotConnected)
        ));
    }

    #[test]
    fn test_register_rejects_invalid_schema() {
        let mut queryhaus = QueryHaus::with_executor(Arc::new(EmptyExecutor));
        let err = queryhaus.register::<Invalid>().unwrap_err();

        assert!(matches!(err, QueryHausError::Query(QueryError::Validation(_))));
        assert!(queryhaus.registered_tables().is_empty());
    }
}
