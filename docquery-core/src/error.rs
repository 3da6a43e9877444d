//! Error types for docquery-core.
//!
//! Minimal error types without any I/O or host dependencies.

use thiserror::Error;

/// Query error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The query clause does not follow the grammar.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A predicate could not be evaluated (for example an invalid regex).
    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Type error: {0}")]
    TypeError(String),
}

impl QueryError {
    /// Parse error pointing at a byte offset in the query text.
    pub fn parse_at(offset: usize, message: impl std::fmt::Display) -> Self {
        QueryError::ParseError(format!("{} at offset {}", message, offset))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl serde::Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
