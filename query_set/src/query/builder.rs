//! Query set
//!
//! An immutable accumulator of filter, order and pagination state for one
//! table. Fluent methods borrow the receiver and return a new query set, so a
//! query can be branched and reused freely; terminal methods hand the state to
//! the executor and may be called any number of times.

use crate::errors::{QueryError, SchemaError};
use crate::executor::{QueryExecutor, Row};
use crate::query::aggregation::{Aggregate, AggregateFunction};
use crate::query::filter::{FilterNode, FilterOperator, Predicate, PredicateGroup};
use crate::query::ordering::{OrderClause, SortOrder};
use crate::query::pagination::Pagination;
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::schema::{Model, TableSchema};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct QuerySet<M> {
    state: QueryState,
    executor: Arc<dyn QueryExecutor>,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            executor: Arc::clone(&self.executor),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("table", &self.state.schema().table())
            .field("filter", &self.state.filter)
            .field("order", &self.state.order)
            .field("pagination", &self.state.pagination)
            .finish()
    }
}

impl<M> QuerySet<M> {
    /// Empty query set over `schema`
    pub fn new(schema: Arc<TableSchema>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            state: QueryState::new(schema),
            executor,
            _model: PhantomData,
        }
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self {
            state,
            executor: Arc::clone(&self.executor),
            _model: PhantomData,
        }
    }

    // ========================================
    // Fluent methods
    // ========================================

    /// Independent copy with identical state
    pub fn all(&self) -> Self {
        self.clone()
    }

    /// AND a predicate onto the filter, the operator spelled as text (`"="`, `"not in"`, ...)
    pub fn filter(&self, column: &str, operator: &str, value: Option<Value>) -> Result<Self, QueryError> {
        self.ensure_filter_column(column)?;
        let predicate = Predicate::parse(column, operator, value)?;
        Ok(self.push_filter(predicate.into()))
    }

    /// AND a predicate onto the filter using a typed operator
    pub fn filter_op(&self, column: &str, operator: FilterOperator, value: Option<Value>) -> Result<Self, QueryError> {
        self.ensure_filter_column(column)?;
        Ok(self.push_filter(Predicate::new(column, operator, value).into()))
    }

    /// AND a prebuilt predicate or group onto the filter
    pub fn filter_node(&self, node: impl Into<FilterNode>) -> Result<Self, QueryError> {
        let node = node.into();
        match &node {
            FilterNode::Predicate(predicate) => self.ensure_filter_column(predicate.column())?,
            FilterNode::Group(group) => {
                for column in group.columns() {
                    self.ensure_filter_column(column)?;
                }
            }
        }
        Ok(self.push_filter(node))
    }

    /// Alias of [`QuerySet::filter_node`] for composite AND/OR groups
    pub fn filter_group(&self, group: PredicateGroup) -> Result<Self, QueryError> {
        self.filter_node(group)
    }

    /// Append a sort key; `direction` must be `"asc"` or `"desc"`
    pub fn order_by(&self, column: &str, direction: &str) -> Result<Self, QueryError> {
        let direction: SortOrder = direction.parse()?;
        self.order_by_dir(column, direction)
    }

    pub fn order_by_asc(&self, column: &str) -> Result<Self, QueryError> {
        self.order_by_dir(column, SortOrder::Asc)
    }

    pub fn order_by_desc(&self, column: &str) -> Result<Self, QueryError> {
        self.order_by_dir(column, SortOrder::Desc)
    }

    pub fn order_by_dir(&self, column: &str, direction: SortOrder) -> Result<Self, QueryError> {
        if !self.state.schema.has_column(column) {
            return Err(SchemaError::OrderColumn {
                column: column.to_string(),
                table: self.table().to_string(),
            }
            .into());
        }

        let mut state = self.state.clone();
        state.order.push(OrderClause::new(column, direction));
        Ok(self.with_state(state))
    }

    /// Replace the pagination window
    pub fn limit(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Self, QueryError> {
        let pagination = Pagination::new(limit, offset)?;
        Ok(self.with_pagination(pagination))
    }

    /// Replace the pagination window from textual arguments
    pub fn limit_str(&self, limit: Option<&str>, offset: Option<&str>) -> Result<Self, QueryError> {
        let pagination = Pagination::parse(limit, offset)?;
        Ok(self.with_pagination(pagination))
    }

    fn with_pagination(&self, pagination: Pagination) -> Self {
        let mut state = self.state.clone();
        state.pagination = pagination;
        self.with_state(state)
    }

    fn push_filter(&self, node: FilterNode) -> Self {
        let mut state = self.state.clone();
        state.filter = Some(match &self.state.filter {
            Some(group) => group.with(node),
            None => PredicateGroup::and([node]),
        });
        self.with_state(state)
    }

    fn ensure_filter_column(&self, column: &str) -> Result<(), SchemaError> {
        if self.state.schema.has_column(column) {
            Ok(())
        } else {
            Err(SchemaError::FilterColumn {
                column: column.to_string(),
                table: self.table().to_string(),
            })
        }
    }

    fn ensure_projection(&self, columns: &[&str]) -> Result<Projection, SchemaError> {
        if let Some(missing) = columns.iter().find(|c| !self.state.schema.has_column(c)) {
            return Err(SchemaError::ProjectionColumn {
                column: missing.to_string(),
                table: self.table().to_string(),
            });
        }
        Ok(Projection::columns(columns.iter().copied()))
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn table(&self) -> &str {
        self.state.schema.table()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.state.schema
    }

    /// The accumulated filter tree, if any filter was added
    pub fn filter_tree(&self) -> Option<&PredicateGroup> {
        self.state.filter.as_ref()
    }

    /// Sort keys rendered as `"column direction"`
    pub fn order(&self) -> Vec<String> {
        self.state.order.iter().map(ToString::to_string).collect()
    }

    pub fn order_clauses(&self) -> &[OrderClause] {
        &self.state.order
    }

    pub fn pagination(&self) -> Pagination {
        self.state.pagination
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    // ========================================
    // Terminal methods
    // ========================================

    /// Number of rows matching the filter; order and pagination are ignored
    pub async fn count(&self) -> Result<u64, QueryError> {
        self.executor.count(&self.state).await
    }

    pub async fn exists(&self) -> Result<bool, QueryError> {
        Ok(self.count().await? > 0)
    }

    pub async fn aggregate(&self, function: AggregateFunction, column: &str) -> Result<Value, QueryError> {
        if !self.state.schema.has_column(column) {
            return Err(SchemaError::AggregateColumn {
                column: column.to_string(),
                table: self.table().to_string(),
            }
            .into());
        }

        let aggregate = Aggregate::of(function, column);
        self.executor.aggregate(&self.state, &aggregate).await
    }

    pub async fn avg(&self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Avg, column).await
    }

    pub async fn min(&self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Min, column).await
    }

    pub async fn max(&self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Max, column).await
    }

    pub async fn sum(&self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Sum, column).await
    }

    /// Rows as column-name keyed maps; all columns when `columns` is empty
    pub async fn values(&self, columns: &[&str]) -> Result<Vec<Map<String, Value>>, QueryError> {
        let projection = self.ensure_projection(columns)?;
        let rows = self.executor.select(&self.state, &projection).await?;
        Ok(rows.into_iter().map(Row::into_map).collect())
    }

    /// Rows as positional value lists; all columns when `columns` is empty
    pub async fn values_list(&self, columns: &[&str]) -> Result<Vec<Vec<Value>>, QueryError> {
        let projection = self.ensure_projection(columns)?;
        let rows = self.executor.select(&self.state, &projection).await?;
        Ok(rows.into_iter().map(Row::into_values).collect())
    }

    /// Distinct combinations of `columns` among matching rows
    pub async fn distinct(&self, columns: &[&str]) -> Result<Vec<Map<String, Value>>, QueryError> {
        let projection = self.ensure_projection(columns)?.distinct();
        let rows = self.executor.select(&self.state, &projection).await?;
        Ok(rows.into_iter().map(Row::into_map).collect())
    }

    /// Batch UPDATE of matching rows, returning how many were changed
    pub async fn update(&self, changes: &UpdateSet) -> Result<u64, QueryError> {
        if let Some(missing) = changes.columns().find(|c| !self.state.schema.has_column(c)) {
            return Err(SchemaError::UpdateColumn {
                column: missing.to_string(),
                table: self.table().to_string(),
            }
            .into());
        }
        self.executor.update(&self.state, changes).await
    }

    /// Batch DELETE of matching rows, returning how many were removed
    pub async fn delete(&self) -> Result<u64, QueryError> {
        self.executor.delete(&self.state).await
    }
}

impl<M: Model> QuerySet<M> {
    /// Matching rows mapped into the model
    pub async fn fetch(&self) -> Result<Vec<M>, QueryError> {
        let rows = self.executor.select(&self.state, &Projection::all()).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(Value::Object(row.into_map()))
                    .map_err(|e| QueryError::serialization(self.table(), e))
            })
            .collect()
    }

    /// The only matching row
    pub async fn single(&self) -> Result<M, QueryError> {
        let mut rows = self.fetch().await?;
        match rows.len() {
            0 => Err(QueryError::NotFound(self.table().to_string())),
            1 => Ok(rows.remove(0)),
            count => Err(QueryError::MultipleResults {
                table: self.table().to_string(),
                count,
            }),
        }
    }
}
