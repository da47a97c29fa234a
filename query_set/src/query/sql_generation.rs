//! Statement rendering
//!
//! Turns an accumulated [`QueryState`] into complete SELECT / UPDATE / DELETE /
//! aggregate statements for one SQL dialect, and model values into INSERTs.

use crate::errors::FilterError;
use crate::query::aggregation::Aggregate;
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::schema::TableSchema;
use crate::validation::ValidationError;
use serde_json::Value;

/// Placeholder and case-insensitive matching conventions of a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `?` placeholders, `LOWER(..) LIKE LOWER(..)` for ilike
    #[default]
    Standard,
    /// Same conventions as `Standard`
    Sqlite,
    /// `$1..$n` placeholders, native `ILIKE`
    Postgres,
}

impl Dialect {
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Standard | Dialect::Sqlite => "?".to_string(),
        }
    }

    pub fn ilike(&self, column: &str, placeholder: &str) -> String {
        match self {
            Dialect::Postgres => format!("{} ILIKE {}", column, placeholder),
            Dialect::Standard | Dialect::Sqlite => {
                format!("LOWER({}) LIKE LOWER({})", column, placeholder)
            }
        }
    }

    fn offset_without_limit(&self) -> Option<&'static str> {
        match self {
            // SQLite only accepts OFFSET after a LIMIT
            Dialect::Sqlite => Some("LIMIT -1"),
            Dialect::Standard | Dialect::Postgres => None,
        }
    }
}

/// Parameter list and placeholder counter of one statement
#[derive(Debug)]
pub struct RenderContext {
    dialect: Dialect,
    next_param: usize,
    params: Vec<Value>,
}

impl RenderContext {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            next_param: 1,
            params: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Record a parameter and return the placeholder that refers to it
    pub fn bind(&mut self, value: Value) -> String {
        let placeholder = self.dialect.placeholder(self.next_param);
        self.next_param += 1;
        self.params.push(value);
        placeholder
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

/// A rendered statement with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

pub struct SqlGenerator {
    dialect: Dialect,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Build `SELECT [DISTINCT] ... FROM ... [WHERE] [ORDER BY] [LIMIT] [OFFSET]`
    ///
    /// DISTINCT selections ignore the pagination window.
    pub fn select(&self, state: &QueryState, projection: &Projection) -> Result<SqlStatement, FilterError> {
        let mut ctx = RenderContext::new(self.dialect);

        let columns = if projection.column_names().is_empty() {
            state.schema().columns().join(", ")
        } else {
            projection.column_names().join(", ")
        };

        let mut sql = String::with_capacity(64 + columns.len());
        sql.push_str("SELECT ");
        if projection.is_distinct() {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns);
        sql.push_str(" FROM ");
        sql.push_str(state.schema().table());

        Self::push_clause(&mut sql, &Self::build_where_clause(state, &mut ctx)?);
        Self::push_clause(&mut sql, &Self::build_order_clause(state));
        if !projection.is_distinct() {
            Self::push_clause(&mut sql, &self.build_limit_clause(state));
        }

        Ok(SqlStatement {
            sql,
            params: ctx.into_params(),
        })
    }

    /// Build `SELECT COUNT(*) FROM ... [WHERE]`
    pub fn count(&self, state: &QueryState) -> Result<SqlStatement, FilterError> {
        let mut ctx = RenderContext::new(self.dialect);
        let mut sql = format!("SELECT COUNT(*) FROM {}", state.schema().table());
        Self::push_clause(&mut sql, &Self::build_where_clause(state, &mut ctx)?);

        Ok(SqlStatement {
            sql,
            params: ctx.into_params(),
        })
    }

    /// Build `SELECT AVG(col) FROM ... [WHERE]` and friends
    pub fn aggregate(&self, state: &QueryState, aggregate: &Aggregate) -> Result<SqlStatement, FilterError> {
        let mut ctx = RenderContext::new(self.dialect);
        let mut sql = format!(
            "SELECT {} FROM {}",
            aggregate.to_sql(),
            state.schema().table()
        );
        Self::push_clause(&mut sql, &Self::build_where_clause(state, &mut ctx)?);

        Ok(SqlStatement {
            sql,
            params: ctx.into_params(),
        })
    }

    /// Build `UPDATE ... SET a = ?, b = ? [WHERE]`; SET parameters come first
    pub fn update(&self, state: &QueryState, changes: &UpdateSet) -> Result<SqlStatement, crate::QueryError> {
        if changes.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }

        let mut ctx = RenderContext::new(self.dialect);
        let assignments: Vec<String> = changes
            .iter()
            .map(|(column, value)| format!("{} = {}", column, ctx.bind(value.clone())))
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            state.schema().table(),
            assignments.join(", ")
        );
        Self::push_clause(&mut sql, &Self::build_where_clause(state, &mut ctx)?);

        Ok(SqlStatement {
            sql,
            params: ctx.into_params(),
        })
    }

    /// Build `DELETE FROM ... [WHERE]`
    pub fn delete(&self, state: &QueryState) -> Result<SqlStatement, FilterError> {
        let mut ctx = RenderContext::new(self.dialect);
        let mut sql = format!("DELETE FROM {}", state.schema().table());
        Self::push_clause(&mut sql, &Self::build_where_clause(state, &mut ctx)?);

        Ok(SqlStatement {
            sql,
            params: ctx.into_params(),
        })
    }

    /// Build `INSERT INTO ... (a, b) VALUES (?, ?)`, or `DEFAULT VALUES` without columns
    pub fn insert(&self, schema: &TableSchema, values: &UpdateSet) -> SqlStatement {
        if values.is_empty() {
            return SqlStatement {
                sql: format!("INSERT INTO {} DEFAULT VALUES", schema.table()),
                params: Vec::new(),
            };
        }

        let mut ctx = RenderContext::new(self.dialect);
        let placeholders: Vec<String> = values.iter().map(|(_, value)| ctx.bind(value.clone())).collect();
        let columns: Vec<&str> = values.columns().collect();

        SqlStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                schema.table(),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params: ctx.into_params(),
        }
    }

    /// Build WHERE clause, empty when there is no filter
    pub fn build_where_clause(state: &QueryState, ctx: &mut RenderContext) -> Result<String, FilterError> {
        match state.filter() {
            Some(group) => Ok(format!("WHERE {}", group.render_with(ctx)?)),
            None => Ok(String::new()),
        }
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(state: &QueryState) -> String {
        if state.order().is_empty() {
            return String::new();
        }

        let order_items: Vec<String> = state.order().iter().map(|clause| clause.to_sql()).collect();
        format!("ORDER BY {}", order_items.join(", "))
    }

    /// Build LIMIT/OFFSET clause
    pub fn build_limit_clause(&self, state: &QueryState) -> String {
        let pagination = state.pagination();
        let mut clauses = Vec::new();

        match (pagination.limit(), pagination.offset()) {
            (Some(limit), _) => clauses.push(format!("LIMIT {}", limit)),
            (None, Some(_)) => {
                if let Some(unbounded) = self.dialect.offset_without_limit() {
                    clauses.push(unbounded.to_string());
                }
            }
            (None, None) => {}
        }

        if let Some(offset) = pagination.offset() {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }

    fn push_clause(sql: &mut String, clause: &str) {
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(clause);
        }
    }
}
