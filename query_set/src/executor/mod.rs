//! Query executors
//!
//! An executor renders the accumulated state of a query set into a statement
//! for its dialect, binds the parameters and runs it.

pub mod postgres;
pub mod sqlite;

use crate::errors::QueryError;
use crate::query::aggregation::Aggregate;
use crate::query::sql_generation::Dialect;
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::schema::TableSchema;
use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use std::fmt::Debug;

pub use postgres::PgExecutor;
pub use sqlite::SqliteExecutor;

#[async_trait]
pub trait QueryExecutor: Send + Sync + Debug {
    /// Dialect the executor renders statements for
    fn dialect(&self) -> Dialect;

    /// Run a SELECT honouring filter, order, limit and offset
    async fn select(&self, state: &QueryState, projection: &Projection) -> Result<Vec<Row>, QueryError>;

    /// Count rows matching the filter
    async fn count(&self, state: &QueryState) -> Result<u64, QueryError>;

    /// Compute one aggregate over rows matching the filter
    async fn aggregate(&self, state: &QueryState, aggregate: &Aggregate) -> Result<Value, QueryError>;

    /// Apply changes to rows matching the filter, returning the affected count
    async fn update(&self, state: &QueryState, changes: &UpdateSet) -> Result<u64, QueryError>;

    /// Delete rows matching the filter, returning the affected count
    async fn delete(&self, state: &QueryState) -> Result<u64, QueryError>;

    /// Insert one row built from `values`, returning the affected count
    async fn insert(&self, schema: &TableSchema, values: &UpdateSet) -> Result<u64, QueryError>;
}

/// Bind form of a JSON number
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NumericParam {
    Integer(i64),
    Float(f64),
    /// Unsigned value above `i64::MAX`, kept as its decimal digits
    Text(String),
}

impl NumericParam {
    pub(crate) fn from_number(number: &Number) -> Self {
        if let Some(i) = number.as_i64() {
            return NumericParam::Integer(i);
        }
        match number.as_f64() {
            Some(f) if number.is_f64() => NumericParam::Float(f),
            _ => NumericParam::Text(number.to_string()),
        }
    }
}

/// One result row, columns in select order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name-keyed form of the row
    pub fn into_map(self) -> Map<String, Value> {
        self.columns.into_iter().zip(self.values).collect()
    }

    /// Positional form of the row
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_access() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![json!(1), json!("pero")],
        );

        assert_eq!(row.get("name"), Some(&json!("pero")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
        assert_eq!(row.clone().into_values(), vec![json!(1), json!("pero")]);

        let map = row.into_map();
        assert_eq!(map.get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_numeric_param_keeps_large_unsigned_exact() {
        let bind = |value: Value| match value {
            Value::Number(n) => NumericParam::from_number(&n),
            other => panic!("not a number: {:?}", other),
        };

        assert_eq!(bind(json!(-7)), NumericParam::Integer(-7));
        assert_eq!(bind(json!(i64::MAX)), NumericParam::Integer(i64::MAX));
        assert_eq!(bind(json!(2.5)), NumericParam::Float(2.5));
        assert_eq!(
            bind(json!(u64::MAX)),
            NumericParam::Text("18446744073709551615".to_string())
        );
    }
}
