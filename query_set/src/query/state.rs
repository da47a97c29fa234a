use crate::query::filter::PredicateGroup;
use crate::query::ordering::OrderClause;
use crate::query::pagination::Pagination;
use crate::schema::TableSchema;
use std::sync::Arc;

/// Everything a query set has accumulated: the request handed to an executor
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub(crate) schema: Arc<TableSchema>,
    pub(crate) filter: Option<PredicateGroup>,
    pub(crate) order: Vec<OrderClause>,
    pub(crate) pagination: Pagination,
}

impl QueryState {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            filter: None,
            order: Vec::new(),
            pagination: Pagination::default(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The filter tree, `None` when it is absent or has no children
    pub fn filter(&self) -> Option<&PredicateGroup> {
        self.filter.as_ref().filter(|group| !group.is_empty())
    }

    pub fn order(&self) -> &[OrderClause] {
        &self.order
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

/// Column subset of a SELECT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<String>,
    distinct: bool,
}

impl Projection {
    /// Every column of the table
    pub fn all() -> Self {
        Self::default()
    }

    /// The given columns, or every column when empty
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }
}
