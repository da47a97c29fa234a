use crate::validation::ValidationError;
use std::fmt;
use std::str::FromStr;

/// Represents SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// AVG(column)
    Avg,
    /// MIN(column)
    Min,
    /// MAX(column)
    Max,
    /// SUM(column)
    Sum,
}

impl AggregateFunction {
    /// Convert aggregate function to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Sum => "SUM",
        }
    }
}

impl FromStr for AggregateFunction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avg" => Ok(AggregateFunction::Avg),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "sum" => Ok(AggregateFunction::Sum),
            _ => Err(ValidationError::InvalidAggregate(s.to_string())),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Function and target column of a scalar aggregate request
///
/// The column is checked against a schema by the query builder, so the same
/// descriptor works for any table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    function: AggregateFunction,
    column: String,
}

impl Aggregate {
    pub fn new(function: &str, column: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self::of(function.parse()?, column))
    }

    pub fn of(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            function,
            column: column.into(),
        }
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn to_sql(&self) -> String {
        format!("{}({})", self.function.to_sql(), self.column)
    }
}
