//! Filter tree
//!
//! Leaf predicates, AND/OR groups over them, and their rendering into SQL
//! fragments with positionally ordered parameter lists.

use crate::errors::FilterError;
use crate::query::sql_generation::{Dialect, RenderContext};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,      // =
    Neq,     // !=
    Gt,      // >
    Gte,     // >=
    Lt,      // <
    Lte,     // <=
    In,      // IN (...)
    NotIn,   // NOT IN (...)
    IsNull,  // IS NULL
    NotNull, // IS NOT NULL
    Like,    // LIKE
    NotLike, // NOT LIKE
    ILike,   // case-insensitive LIKE, rendering depends on the dialect
    Between, // BETWEEN ? AND ?
}

impl FilterOperator {
    /// Name used in error messages and `Display`
    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Neq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::NotNull => "NOT NULL",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::ILike => "ILIKE",
            FilterOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    /// Accepts SQL-style symbols as well as snake_case names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let operator = match normalized.as_str() {
            "=" | "eq" => FilterOperator::Eq,
            "!=" | "<>" | "neq" => FilterOperator::Neq,
            ">" | "gt" => FilterOperator::Gt,
            ">=" | "gte" => FilterOperator::Gte,
            "<" | "lt" => FilterOperator::Lt,
            "<=" | "lte" => FilterOperator::Lte,
            "in" => FilterOperator::In,
            "not in" | "not_in" => FilterOperator::NotIn,
            "is null" | "is_null" => FilterOperator::IsNull,
            "not null" | "not_null" | "is not null" => FilterOperator::NotNull,
            "like" => FilterOperator::Like,
            "not like" | "not_like" => FilterOperator::NotLike,
            "ilike" => FilterOperator::ILike,
            "between" => FilterOperator::Between,
            _ => return Err(FilterError::UnknownOperation(s.to_ascii_uppercase())),
        };
        Ok(operator)
    }
}

/// Single column/operator/value condition
///
/// The value shape is only checked when the predicate is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    operator: FilterOperator,
    value: Option<Value>, // None for IS NULL / IS NOT NULL
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Option<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Create a predicate from an operator spelled as text, e.g. `"not in"`
    pub fn parse(
        column: impl Into<String>,
        operator: &str,
        value: Option<Value>,
    ) -> Result<Self, FilterError> {
        Ok(Self::new(column, operator.parse()?, value))
    }

    pub fn eq(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Eq, Some(value))
    }

    pub fn neq(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Neq, Some(value))
    }

    pub fn gt(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Gt, Some(value))
    }

    pub fn gte(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Gte, Some(value))
    }

    pub fn lt(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Lt, Some(value))
    }

    pub fn lte(column: &str, value: Value) -> Self {
        Self::new(column, FilterOperator::Lte, Some(value))
    }

    pub fn like(column: &str, pattern: &str) -> Self {
        Self::new(
            column,
            FilterOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn not_like(column: &str, pattern: &str) -> Self {
        Self::new(
            column,
            FilterOperator::NotLike,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn ilike(column: &str, pattern: &str) -> Self {
        Self::new(
            column,
            FilterOperator::ILike,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn in_values(column: &str, values: Vec<Value>) -> Self {
        Self::new(column, FilterOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(column: &str, values: Vec<Value>) -> Self {
        Self::new(column, FilterOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(column: &str) -> Self {
        Self::new(column, FilterOperator::IsNull, None)
    }

    pub fn not_null(column: &str) -> Self {
        Self::new(column, FilterOperator::NotNull, None)
    }

    pub fn between(column: &str, low: Value, high: Value) -> Self {
        Self::new(
            column,
            FilterOperator::Between,
            Some(Value::Array(vec![low, high])),
        )
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Render with `?` placeholders
    pub fn render(&self) -> Result<(String, Vec<Value>), FilterError> {
        let mut ctx = RenderContext::new(Dialect::Standard);
        let fragment = self.render_with(&mut ctx)?;
        Ok((fragment, ctx.into_params()))
    }

    /// Render into a statement being built, continuing its placeholder numbering
    pub fn render_with(&self, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let column = &self.column;

        match self.operator {
            FilterOperator::Eq => self.render_comparison("=", ctx),
            FilterOperator::Neq => self.render_comparison("!=", ctx),
            FilterOperator::Gt => self.render_comparison(">", ctx),
            FilterOperator::Gte => self.render_comparison(">=", ctx),
            FilterOperator::Lt => self.render_comparison("<", ctx),
            FilterOperator::Lte => self.render_comparison("<=", ctx),
            FilterOperator::Like => self.render_comparison("LIKE", ctx),
            FilterOperator::NotLike => self.render_comparison("NOT LIKE", ctx),
            FilterOperator::ILike => {
                let value = self.scalar_value()?;
                let placeholder = ctx.bind(value.clone());
                Ok(ctx.dialect().ilike(column, &placeholder))
            }
            FilterOperator::In => self.render_list("IN", ctx),
            FilterOperator::NotIn => self.render_list("NOT IN", ctx),
            FilterOperator::IsNull => {
                self.expect_absent()?;
                Ok(format!("{} IS NULL", column))
            }
            FilterOperator::NotNull => {
                self.expect_absent()?;
                Ok(format!("{} IS NOT NULL", column))
            }
            FilterOperator::Between => match &self.value {
                Some(Value::Array(bounds)) if bounds.len() == 2 => {
                    let low = ctx.bind(bounds[0].clone());
                    let high = ctx.bind(bounds[1].clone());
                    Ok(format!("{} BETWEEN {} AND {}", column, low, high))
                }
                _ => Err(self.invalid_value("an array of two values")),
            },
        }
    }

    fn render_comparison(&self, sql_operator: &str, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let value = self.scalar_value()?;
        let placeholder = ctx.bind(value.clone());
        Ok(format!("{} {} {}", self.column, sql_operator, placeholder))
    }

    fn render_list(&self, sql_operator: &str, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let values = match &self.value {
            Some(Value::Array(values)) if !values.is_empty() => values,
            _ => return Err(self.invalid_value("an array with one or more values")),
        };

        let placeholders: Vec<String> = values.iter().map(|v| ctx.bind(v.clone())).collect();
        Ok(format!(
            "{} {} ({})",
            self.column,
            sql_operator,
            placeholders.join(", ")
        ))
    }

    fn scalar_value(&self) -> Result<&Value, FilterError> {
        match &self.value {
            Some(Value::Array(_)) | None => Err(self.invalid_value("a single value")),
            Some(value) => Ok(value),
        }
    }

    fn expect_absent(&self) -> Result<(), FilterError> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(self.invalid_value("no value")),
        }
    }

    fn invalid_value(&self, expected: &'static str) -> FilterError {
        FilterError::InvalidValue {
            operation: self.operator.label(),
            expected,
        }
    }
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn separator(&self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// Either a leaf predicate or a nested group
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Predicate(Predicate),
    Group(PredicateGroup),
}

impl FilterNode {
    pub fn render_with(&self, ctx: &mut RenderContext) -> Result<String, FilterError> {
        match self {
            FilterNode::Predicate(predicate) => predicate.render_with(ctx),
            FilterNode::Group(group) => Ok(format!("({})", group.render_with(ctx)?)),
        }
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterNode::Predicate(predicate) => out.push(predicate.column()),
            FilterNode::Group(group) => {
                for child in &group.children {
                    child.collect_columns(out);
                }
            }
        }
    }
}

impl From<Predicate> for FilterNode {
    fn from(predicate: Predicate) -> Self {
        FilterNode::Predicate(predicate)
    }
}

impl From<PredicateGroup> for FilterNode {
    fn from(group: PredicateGroup) -> Self {
        FilterNode::Group(group)
    }
}

/// AND/OR combination of predicates and nested groups
///
/// Child order is the order of placeholders in the rendered fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateGroup {
    combinator: Combinator,
    children: Vec<FilterNode>,
}

impl PredicateGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            children: Vec::new(),
        }
    }

    pub fn and<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FilterNode>,
    {
        Self {
            combinator: Combinator::And,
            children: nodes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FilterNode>,
    {
        Self {
            combinator: Combinator::Or,
            children: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// Copy of this group with one more child appended
    pub fn with(&self, node: impl Into<FilterNode>) -> Self {
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.extend(self.children.iter().cloned());
        children.push(node.into());
        Self {
            combinator: self.combinator,
            children,
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Every column referenced anywhere in the tree, in encounter order
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = Vec::new();
        for child in &self.children {
            child.collect_columns(&mut columns);
        }
        columns
    }

    /// Render with `?` placeholders
    pub fn render(&self) -> Result<(String, Vec<Value>), FilterError> {
        let mut ctx = RenderContext::new(Dialect::Standard);
        let fragment = self.render_with(&mut ctx)?;
        Ok((fragment, ctx.into_params()))
    }

    pub fn render_with(&self, ctx: &mut RenderContext) -> Result<String, FilterError> {
        if self.children.is_empty() {
            return Ok("1=1".to_string());
        }

        let fragments = self
            .children
            .iter()
            .map(|child| child.render_with(ctx))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(fragments.join(self.combinator.separator()))
    }
}
