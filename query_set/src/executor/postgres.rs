//! PostgreSQL executor
//!
//! Parameters bind by JSON kind (null, bool, i64, f64, text, jsonb), so a
//! comparison against a non-text column needs a value of the matching kind.

use super::{NumericParam, QueryExecutor, Row};
use crate::errors::QueryError;
use crate::query::aggregation::Aggregate;
use crate::query::sql_generation::{Dialect, SqlGenerator, SqlStatement};
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::schema::TableSchema;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};

#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn generator(&self) -> SqlGenerator {
        SqlGenerator::new(Dialect::Postgres)
    }

    fn prepare<'q>(statement: &'q SqlStatement) -> Query<'q, Postgres, PgArguments> {
        statement
            .params
            .iter()
            .fold(sqlx::query(&statement.sql), bind_value)
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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

/// Bind one parameter by its JSON kind
///
/// `Value::Null` binds as a TEXT-typed NULL, so comparing it against a
/// non-text column fails with a type mismatch; use `is null` filters instead.
/// Unsigned numbers above `i64::MAX` bind as text.
fn bind_value<'q>(query: Query<'q, Postgres, PgArguments>, value: &Value) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match NumericParam::from_number(n) {
            NumericParam::Integer(i) => query.bind(i),
            NumericParam::Float(f) => query.bind(f),
            NumericParam::Text(digits) => query.bind(digits),
        },
        Value::String(s) => query.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => query.bind(sqlx::types::Json(value.clone())),
    }
}

fn decode_row(row: &PgRow) -> Result<Row, QueryError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(decode_column(row, index)?);
    }

    Ok(Row::new(columns, values))
}

fn decode_column(row: &PgRow, index: usize) -> Result<Value, QueryError> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(Value::from),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(index)?.map(decimal_to_value),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::String)
        }
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|ts| Value::String(ts.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|ts| Value::String(ts.to_rfc3339())),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|id| Value::String(id.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        other => {
            return Err(QueryError::Decode {
                column: column.name().to_string(),
                type_name: other.to_string(),
            })
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Whole numbers become JSON integers, everything else a float
fn decimal_to_value(decimal: Decimal) -> Value {
    let number = if decimal.fract().is_zero() {
        decimal.to_i64().map(Value::from)
    } else {
        decimal.to_f64().map(Value::from)
    };
    number.unwrap_or_else(|| Value::String(decimal.to_string()))
}
