//! Store client error types
//!
//! This is the store-agnostic taxonomy every `RelationalStore` and
//! `BlobStore` implementation maps its backend errors onto. Callers above
//! the store never match on vendor error codes.

use thiserror::Error;

/// the main error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// the physical table/relation does not exist (yet)
    #[error("relation not provisioned: {table}")]
    RelationNotProvisioned { table: String },

    /// no row with the given id
    #[error("row not found: table={table}, id={id}")]
    RowNotFound { table: String, id: String },

    /// a row with the given id already exists
    #[error("row already exists: table={table}, id={id}")]
    RowAlreadyExists { table: String, id: String },

    /// the storage bucket does not exist
    #[error("bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// the row handed to the store is malformed
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// the store does not implement the requested primitive
    #[error("unsupported store operation: {0}")]
    Unsupported(String),

    /// network or server failure
    #[error("transport error: {0}")]
    Transport(String),

    /// rejected credentials or missing permission
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// check if this error indicates the row doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::RowNotFound { .. })
    }

    /// check if this error indicates the relation doesn't exist
    pub fn is_not_provisioned(&self) -> bool {
        matches!(self, StoreError::RelationNotProvisioned { .. })
    }

    /// a missing bucket can be retried against a fallback bucket
    pub fn is_recoverable_bucket_error(&self) -> bool {
        matches!(self, StoreError::BucketNotFound { .. })
    }

    /// check if this error is recoverable by retry
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }
}

/// result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
