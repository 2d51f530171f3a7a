//! Collaborator interfaces the data layer runs against.
//!
//! The data layer never talks to a network client directly. It is handed an
//! `Arc<dyn RelationalStore>` at construction; uploads go through a
//! `BlobStore`. Both are async traits so HTTP-backed clients fit without
//! blocking.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{StoreError, StoreResult};
use super::native::{NativeFilter, NativeQuery};

/// A physical row: column name -> value.
pub type PhysicalRow = serde_json::Map<String, Value>;

/// Describes what the store can do natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// The store can count matching rows without returning them.
    pub native_count: bool,
}

impl Capability {
    /// Everything supported.
    pub const FULL: Self = Self { native_count: true };

    /// Row-returning queries only.
    pub const MINIMAL: Self = Self {
        native_count: false,
    };
}

/// Kind of physical row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row mutation as delivered by the store's change channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    pub table: String,
    pub kind: RowChangeKind,
    pub new: Option<PhysicalRow>,
    pub old: Option<PhysicalRow>,
}

/// Callback invoked by the store for each row change on a channel.
pub type RowListener = Arc<dyn Fn(&RowChange) + Send + Sync>;

/// Identifies one registered change channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel-{}", self.0)
    }
}

/// Table-scoped relational store client.
#[async_trait]
pub trait RelationalStore: Send + Sync + 'static {
    /// Describes the store's native capabilities.
    fn capability(&self) -> &Capability;

    /// Return the rows matching `query`, sorted and windowed.
    async fn select(&self, table: &str, query: &NativeQuery) -> StoreResult<Vec<PhysicalRow>>;

    /// Insert a complete row and return it as stored.
    async fn insert(&self, table: &str, row: PhysicalRow) -> StoreResult<PhysicalRow>;

    /// Set the given columns on the row with primary key `id`; return the
    /// full row after the update.
    async fn update(&self, table: &str, id: &str, patch: PhysicalRow) -> StoreResult<PhysicalRow>;

    /// Delete the row with primary key `id`. Deleting a missing row is not an
    /// error.
    async fn delete(&self, table: &str, id: &str) -> StoreResult<()>;

    /// Count rows matching `filters` without returning them.
    ///
    /// Only called when `capability().native_count` is set.
    async fn count(&self, table: &str, filters: &[NativeFilter]) -> StoreResult<u64> {
        let _ = filters;
        Err(StoreError::Unsupported(format!("count on {}", table)))
    }

    /// Open a change channel on `table`.
    fn subscribe(&self, table: &str, listener: RowListener) -> StoreResult<ChannelId>;

    /// Close a change channel. Closing an unknown or closed channel is a no-op.
    fn unsubscribe(&self, channel: ChannelId) -> StoreResult<()>;
}

/// Bucket-scoped blob store client.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Upload `bytes` to `bucket/path` and return its public URL.
    ///
    /// A missing bucket fails with [`StoreError::BucketNotFound`] so callers
    /// can retry against a fallback bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String>;

    /// Public URL of `bucket/path`, whether or not it exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
