use crate::errors::QueryError;
use crate::executor::QueryExecutor;
use crate::query::builder::QuerySet;
use crate::query::filter::{FilterOperator, Predicate};
use crate::query::update::UpdateSet;
use crate::schema::{Model, TableSchema};
use crate::validation::ValidationError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Which statement `save` ended up running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Entry point to the query sets of one model
pub struct ModelStore<M: Model> {
    pub(crate) schema: Arc<TableSchema>,
    pub(crate) executor: Arc<dyn QueryExecutor>,
    pub(crate) _phantom: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for ModelStore<M> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            executor: Arc::clone(&self.executor),
            _phantom: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for ModelStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("table", &self.schema.table())
            .field("dialect", &self.executor.dialect())
            .finish()
    }
}

impl<M: Model> ModelStore<M> {
    /// Build a store from the model's derived schema
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Result<Self, ValidationError> {
        Ok(Self::with_schema(Arc::new(M::schema()?), executor))
    }

    pub fn with_schema(schema: Arc<TableSchema>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            schema,
            executor,
            _phantom: PhantomData,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// A fresh query set with no filter, order or pagination
    pub fn objects(&self) -> QuerySet<M> {
        QuerySet::new(Arc::clone(&self.schema), Arc::clone(&self.executor))
    }

    /// Fetch the single row whose primary key equals `key`, values in key order
    pub async fn get(&self, key: &[Value]) -> Result<M, QueryError> {
        tracing::debug!("[GET] Table: {}, key: {:?}", self.schema.table(), key);
        self.by_primary_key(key)?.single().await
    }

    /// Query set narrowed to one primary key value
    fn by_primary_key(&self, key: &[Value]) -> Result<QuerySet<M>, QueryError> {
        let primary_key = self.require_primary_key()?;
        if primary_key.len() != key.len() {
            return Err(ValidationError::PrimaryKeyArity {
                table: self.schema.table().to_string(),
                expected: primary_key.len(),
                given: key.len(),
            }
            .into());
        }

        let mut query = self.objects();
        for (column, value) in primary_key.iter().zip(key) {
            query = query.filter_node(Predicate::new(
                column.as_str(),
                FilterOperator::Eq,
                Some(value.clone()),
            ))?;
        }
        Ok(query)
    }

    fn require_primary_key(&self) -> Result<&[String], QueryError> {
        let primary_key = self.schema.primary_key();
        if primary_key.is_empty() {
            return Err(ValidationError::NoPrimaryKey(self.schema.table().to_string()).into());
        }
        Ok(primary_key)
    }
}

impl<M: Model + Serialize> ModelStore<M> {
    /// INSERT the model; primary key columns holding null are left to the database
    pub async fn insert(&self, model: &M) -> Result<u64, QueryError> {
        let row = self.column_values(model)?;
        let values: UpdateSet = self
            .schema
            .columns()
            .iter()
            .filter(|column| !(self.is_key(column) && value_of(&row, column).is_null()))
            .map(|column| (column.as_str(), value_of(&row, column).clone()))
            .collect();

        tracing::debug!("[INSERT] Table: {}, columns: {}", self.schema.table(), values.len());
        self.executor.insert(&self.schema, &values).await
    }

    /// UPDATE the row with the model's primary key to the model's other columns
    pub async fn update_instance(&self, model: &M) -> Result<u64, QueryError> {
        let row = self.column_values(model)?;
        let query = self.by_primary_key(&self.key_values(&row)?)?;
        query.update(&self.non_key_values(&row)).await
    }

    /// DELETE the row with the model's primary key
    pub async fn delete_instance(&self, model: &M) -> Result<u64, QueryError> {
        let row = self.column_values(model)?;
        self.by_primary_key(&self.key_values(&row)?)?.delete().await
    }

    /// UPDATE the model's row, or INSERT when the key is unset or matched nothing
    pub async fn save(&self, model: &M) -> Result<SaveOutcome, QueryError> {
        let primary_key = self.require_primary_key()?;
        let row = self.column_values(model)?;

        if primary_key.iter().any(|column| value_of(&row, column).is_null()) {
            self.insert(model).await?;
            return Ok(SaveOutcome::Inserted);
        }

        let query = self.by_primary_key(&self.key_values(&row)?)?;
        let changes = self.non_key_values(&row);
        let matched = if changes.is_empty() {
            query.count().await?
        } else {
            query.update(&changes).await?
        };

        if matched == 0 {
            self.insert(model).await?;
            Ok(SaveOutcome::Inserted)
        } else {
            Ok(SaveOutcome::Updated)
        }
    }

    /// Column values of the model, null for columns it does not serialize
    fn column_values(&self, model: &M) -> Result<Map<String, Value>, QueryError> {
        let table = self.schema.table();
        let mut fields = match serde_json::to_value(model) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(QueryError::Serialization(format!(
                    "Model of table '{}' serialized to {} instead of an object",
                    table, other
                )))
            }
            Err(e) => return Err(QueryError::serialization(table, e)),
        };

        Ok(self
            .schema
            .columns()
            .iter()
            .map(|column| {
                let value = fields.remove(column).unwrap_or(Value::Null);
                (column.clone(), value)
            })
            .collect())
    }

    fn key_values(&self, row: &Map<String, Value>) -> Result<Vec<Value>, QueryError> {
        self.require_primary_key()?
            .iter()
            .map(|column| match value_of(row, column) {
                Value::Null => Err(QueryError::from(ValidationError::MissingPrimaryKeyValue {
                    column: column.clone(),
                    table: self.schema.table().to_string(),
                })),
                value => Ok(value.clone()),
            })
            .collect()
    }

    fn non_key_values(&self, row: &Map<String, Value>) -> UpdateSet {
        self.schema
            .columns()
            .iter()
            .filter(|column| !self.is_key(column))
            .map(|column| (column.as_str(), value_of(&row, column).clone()))
            .collect()
    }

    fn is_key(&self, column: &str) -> bool {
        self.schema.primary_key().iter().any(|pk| pk == column)
    }
}

static NULL: Value = Value::Null;

fn value_of<'a>(row: &'a Map<String, Value>, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}
