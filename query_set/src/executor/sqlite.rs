//! SQLite executor
//!
//! Values decode by their storage class, so aggregates over expressions come
//! back with the type SQLite actually produced. A declared BOOLEAN column is
//! the exception: its INTEGER storage decodes to a JSON bool.

use super::{NumericParam, QueryExecutor, Row};
use crate::errors::QueryError;
use crate::query::aggregation::Aggregate;
use crate::query::sql_generation::{Dialect, SqlGenerator, SqlStatement};
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::schema::TableSchema;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};

#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn generator(&self) -> SqlGenerator {
        SqlGenerator::new(Dialect::Sqlite)
    }

    fn prepare<'q>(statement: &'q SqlStatement) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        statement
            .params
            .iter()
            .fold(sqlx::query(&statement.sql), bind_value)
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn select(&self, state: &QueryState, projection: &Projection) -> Result<Vec<Row>, QueryError> {
        let statement = self.generator().select(state, projection)?;
        tracing::debug!("[SELECT] Table: {}", state.schema().table());
        tracing::debug!("[SELECT] SQL: {}", statement.sql);
        tracing::debug!("[SELECT] params count: {}", statement.params.len());

        let rows = Self::prepare(&statement).fetch_all(&self.pool).await?;
        tracing::trace!("[SELECT] fetched {} rows", rows.len());

        rows.iter().map(decode_row).collect()
    }

    async fn count(&self, state: &QueryState) -> Result<u64, QueryError> {
        let statement = self.generator().count(state)?;
        tracing::debug!("[COUNT] SQL: {}", statement.sql);

        let row = Self::prepare(&statement).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    async fn aggregate(&self, state: &QueryState, aggregate: &Aggregate) -> Result<Value, QueryError> {
        let statement = self.generator().aggregate(state, aggregate)?;
        tracing::debug!("[AGGREGATE] SQL: {}", statement.sql);

        let row = Self::prepare(&statement).fetch_one(&self.pool).await?;
        decode_column(&row, 0)
    }

    async fn update(&self, state: &QueryState, changes: &UpdateSet) -> Result<u64, QueryError> {
        let statement = self.generator().update(state, changes)?;
        tracing::debug!("[UPDATE] Table: {}", state.schema().table());
        tracing::debug!("[UPDATE] SQL: {}", statement.sql);
        tracing::debug!("[UPDATE] params count: {}", statement.params.len());

        let result = Self::prepare(&statement).execute(&self.pool).await?;
        tracing::trace!("[UPDATE] affected {} rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn delete(&self, state: &QueryState) -> Result<u64, QueryError> {
        let statement = self.generator().delete(state)?;
        tracing::debug!("[DELETE] SQL: {}", statement.sql);

        let result = Self::prepare(&statement).execute(&self.pool).await?;
        tracing::trace!("[DELETE] affected {} rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn insert(&self, schema: &TableSchema, values: &UpdateSet) -> Result<u64, QueryError> {
        let statement = self.generator().insert(schema, values);
        tracing::debug!("[INSERT] Table: {}", schema.table());
        tracing::debug!("[INSERT] SQL: {}", statement.sql);
        tracing::debug!("[INSERT] params count: {}", statement.params.len());

        let result = Self::prepare(&statement).execute(&self.pool).await?;
        tracing::trace!("[INSERT] affected {} rows", result.rows_affected());
        Ok(result.rows_affected())
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match NumericParam::from_number(n) {
            NumericParam::Integer(i) => query.bind(i),
            NumericParam::Float(f) => query.bind(f),
            NumericParam::Text(digits) => query.bind(digits),
        },
        Value::String(s) => query.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, QueryError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(decode_column(row, index)?);
    }

    Ok(Row::new(columns, values))
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, QueryError> {
    let storage_class = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };
    let column = &row.columns()[index];
    let declared = column.type_info().name();

    let value = match (declared, storage_class.as_str()) {
        ("BOOLEAN", "INTEGER") => Value::Bool(row.try_get_unchecked::<i64, _>(index)? != 0),
        (_, "INTEGER") => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        (_, "REAL") => Value::from(row.try_get_unchecked::<f64, _>(index)?),
        (_, "TEXT") => Value::String(row.try_get_unchecked::<String, _>(index)?),
        (_, "BLOB") => Value::from(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        (_, other) => {
            return Err(QueryError::Decode {
                column: column.name().to_string(),
                type_name: other.to_string(),
            })
        }
    };

    Ok(value)
}
