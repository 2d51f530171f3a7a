//! Document codec errors.

use thiserror::Error;

use super::document::InvalidIdError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors converting between physical rows and logical documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// the field maps onto a store-managed column
    #[error("reserved field: {0}")]
    ReservedField(String),

    /// the field's column name translates back to a different field
    #[error("field '{field}' maps to column '{column}', which reads back under another name")]
    IrreversibleName { field: String, column: String },

    /// the row has no usable primary key
    #[error("row in {table} has no id")]
    MissingId { table: String },

    #[error("invalid document id: {0}")]
    InvalidId(#[from] InvalidIdError),

    /// the payload column does not hold a JSON object
    #[error("invalid payload in {table}: {reason}")]
    InvalidBlob { table: String, reason: String },

    /// a single-JSON update was encoded without the current document
    #[error("merge update on {table} needs the current document")]
    MissingCurrent { table: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
