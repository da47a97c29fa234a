//! Table metadata
//!
//! The schema descriptor of a table and the trait through which a domain model
//! exposes it.

use crate::validation::{validate_identifier, ValidationError};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Name, columns and primary key of one table
///
/// Every identifier is validated on construction, so the names can be
/// interpolated into statements as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    columns: Vec<String>,
    primary_key: Vec<String>,
}

impl TableSchema {
    pub fn new<C, K>(table: &str, columns: C, primary_key: K) -> Result<Self, ValidationError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        validate_identifier(table)?;

        let mut column_list: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            validate_identifier(&column)?;
            if !column_list.contains(&column) {
                column_list.push(column);
            }
        }

        let primary_key: Vec<String> = primary_key.into_iter().map(Into::into).collect();
        if let Some(missing) = primary_key.iter().find(|pk| !column_list.contains(pk)) {
            return Err(ValidationError::UnknownPrimaryKey {
                column: missing.clone(),
                table: table.to_string(),
            });
        }

        Ok(Self {
            table: table.to_string(),
            columns: column_list,
            primary_key,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// A domain object mapped onto one table
///
/// Usually derived with `#[derive(Model)]` / `#[model]`. Rows are mapped into
/// the model through its `Deserialize` impl, keyed by column name.
pub trait Model: DeserializeOwned + Send + Sync + Debug + 'static {
    /// The table name in the database
    fn table_name() -> &'static str;

    /// Column names in declaration order
    fn columns() -> &'static [&'static str];

    /// Primary key columns, empty when the table has none
    fn primary_key() -> &'static [&'static str] {
        &[]
    }

    /// Build the validated schema descriptor
    fn schema() -> Result<TableSchema, ValidationError> {
        TableSchema::new(
            Self::table_name(),
            Self::columns().iter().copied(),
            Self::primary_key().iter().copied(),
        )
    }
}
