//! Repository error types

use thiserror::Error;

use crate::codec::{CodecError, InvalidIdError};
use crate::query::QueryError;
use crate::store::StoreError;

/// Result type for repository operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors surfaced to callers of the data layer.
///
/// Each failure kind is its own variant so callers can match on it instead
/// of inspecting messages. Store errors have no `From` impl: they are lifted
/// with [`DataError::from_store`] so the logical collection name is kept.
#[derive(Debug, Error)]
pub enum DataError {
    /// `get` on an id with no document
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// the collection's table does not exist in the store yet
    #[error("relation for {collection} is not provisioned (table {table})")]
    RelationNotProvisioned { collection: String, table: String },

    /// the query uses an operator the compiler does not implement
    #[error("unsupported query operator: {operator}")]
    UnsupportedOperator { operator: String },

    /// the (parent, name) pair is not in the subcollection registry
    #[error("unregistered subcollection: {parent}/*/{name}")]
    UnregisteredSubcollection { parent: String, name: String },

    /// a read-modify-write helper found a value of the wrong type
    #[error("field {field} of {collection}/{id} is not {expected}")]
    FieldType {
        collection: String,
        id: String,
        field: String,
        expected: &'static str,
    },

    #[error("invalid query: {0}")]
    Query(QueryError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// transport, auth and server failures, passed through unchanged
    #[error("store error: {0}")]
    Store(StoreError),
}

impl DataError {
    /// Lift a store error raised while serving `collection`.
    pub fn from_store(collection: &str, err: StoreError) -> Self {
        match err {
            StoreError::RelationNotProvisioned { table } => Self::RelationNotProvisioned {
                collection: collection.to_string(),
                table,
            },
            other => Self::Store(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_provisioned(&self) -> bool {
        matches!(self, Self::RelationNotProvisioned { .. })
    }

    /// Network, auth or server failure from the store.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Store(
                StoreError::Transport(_) | StoreError::Unauthorized(_) | StoreError::Internal(_)
            )
        )
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnsupportedOperator(operator) => Self::UnsupportedOperator { operator },
            other => Self::Query(other),
        }
    }
}

impl From<InvalidIdError> for DataError {
    fn from(err: InvalidIdError) -> Self {
        Self::Codec(CodecError::InvalidId(err))
    }
}
