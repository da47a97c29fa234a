//! Validation module
//!
//! Identifier checks for everything that gets interpolated into SQL text, plus
//! the structural argument errors raised by the query builder.

use std::fmt;

/// Validation errors for identifiers and builder arguments
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumeric and underscore allowed)
    InvalidCharacters(String),
    /// Name is too long (PostgreSQL limit is 63 characters)
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
    /// Name is a reserved SQL keyword
    ReservedKeyword(String),
    /// Sort direction other than `asc` / `desc`
    InvalidDirection(String),
    /// Limit that is not a non-negative integer
    InvalidLimit(String),
    /// Offset that is not a non-negative integer
    InvalidOffset(String),
    /// Aggregate function name outside avg/min/max/sum
    InvalidAggregate(String),
    /// Update called without any column changes
    EmptyUpdate,
    /// Primary key column missing from the column list
    UnknownPrimaryKey { column: String, table: String },
    /// Lookup by primary key on a table that has none
    NoPrimaryKey(String),
    /// Wrong number of values for a primary key lookup
    PrimaryKeyArity {
        table: String,
        expected: usize,
        given: usize,
    },
    /// Instance write whose primary key column holds null
    MissingPrimaryKeyValue { column: String, table: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(f, "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed", name)
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} characters (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
            ValidationError::ReservedKeyword(name) => {
                write!(f, "Name '{}' is a reserved SQL keyword", name)
            }
            ValidationError::InvalidDirection(direction) => {
                write!(
                    f,
                    "Invalid order direction [{}]. Expected 'asc' or 'desc'.",
                    direction
                )
            }
            ValidationError::InvalidLimit(limit) => {
                write!(f, "Limit must be an integer or null. Given [{}].", limit)
            }
            ValidationError::InvalidOffset(offset) => {
                write!(f, "Offset must be an integer or null. Given [{}].", offset)
            }
            ValidationError::InvalidAggregate(function) => {
                write!(f, "Invalid aggregate type [{}].", function)
            }
            ValidationError::EmptyUpdate => {
                write!(f, "Update requires at least one column change")
            }
            ValidationError::UnknownPrimaryKey { column, table } => {
                write!(
                    f,
                    "Primary key column [{}] is not a column of table [{}].",
                    column, table
                )
            }
            ValidationError::NoPrimaryKey(table) => {
                write!(f, "Primary key not defined for table [{}].", table)
            }
            ValidationError::PrimaryKeyArity {
                table,
                expected,
                given,
            } => {
                write!(
                    f,
                    "Table [{}] has {} primary key columns. {} arguments given.",
                    table, expected, given
                )
            }
            ValidationError::MissingPrimaryKeyValue { column, table } => {
                write!(
                    f,
                    "Primary key column [{}] of table [{}] has no value.",
                    column, table
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// PostgreSQL identifier length limit
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Check that a name can be interpolated into SQL without quoting
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    let first_char = name.chars().next().ok_or(ValidationError::Empty)?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    if is_reserved_keyword(name) {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }

    Ok(())
}

/// Keywords that would change the meaning of a statement if used bare
fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER", "LEFT",
        "RIGHT", "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE",
        "CASE", "WHEN", "THEN", "ELSE", "END", "EXISTS", "IN", "IS", "LIKE", "ILIKE",
        "BETWEEN", "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION", "ALL",
        "DISTINCT", "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW", "PRIMARY", "KEY",
        "FOREIGN", "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "COLUMN", "SET",
        "VALUES", "INTO", "RETURNING", "ASC", "DESC", "WITH",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}
