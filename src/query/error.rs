//! Query compilation errors.

use thiserror::Error;

/// Result type for query compilation.
pub type QueryResult<T> = Result<T, QueryError>;

/// Query compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The predicate operator has no native translation. Dropping it would
    /// silently widen the result set, so compilation fails instead.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("field name cannot be empty")]
    EmptyField,
}
