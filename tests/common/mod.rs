//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reldoc::catalog::{Catalog, CatalogBuilder, CollectionConfig, Encoding, SubcollectionConfig};
use reldoc::codec::{fields_from_value, Fields};
use reldoc::repository::DocumentRepository;
use reldoc::store::{
    Capability, ChannelId, MemoryStore, NativeFilter, NativeQuery, PhysicalRow, RelationalStore,
    RowListener, StoreResult,
};
use serde_json::Value;

pub fn fields(value: Value) -> Fields {
    fields_from_value(value).expect("fixture must be a JSON object")
}

pub fn row(value: Value) -> PhysicalRow {
    value.as_object().expect("fixture must be a JSON object").clone()
}

/// `books` (flat), `notes` (single JSON), the optional `appConfig`
/// singleton, and `categories/{id}/items` in both encodings.
pub fn catalog() -> Catalog {
    CatalogBuilder::new()
        .flat("books")
        .json("notes")
        .collection(
            CollectionConfig::new("appConfig")
                .encoding(Encoding::SingleJsonColumn)
                .optional(),
        )
        .subcollection(SubcollectionConfig::new("categories", "items", "categoryId"))
        .subcollection(
            SubcollectionConfig::new("categories", "drafts", "categoryId")
                .encoding(Encoding::SingleJsonColumn),
        )
        .build()
        .expect("valid catalog")
}

/// Every table of [`catalog`] except `app_config`.
pub fn provisioned_store(capability: Capability) -> MemoryStore {
    let store = MemoryStore::with_options("id", capability);
    for table in ["books", "notes", "items", "drafts"] {
        store.create_table(table);
    }
    store
}

pub fn repository() -> (MemoryStore, DocumentRepository) {
    let store = provisioned_store(Capability::FULL);
    let repo = DocumentRepository::new(Arc::new(store.clone()), catalog());
    (store, repo)
}

/// A store that lets another writer commit between a caller's read and its
/// write.
///
/// The queued patch is applied to the row right before the next `update`
/// call is delegated, which is exactly the window a read-modify-write
/// leaves open.
#[derive(Clone)]
pub struct RacingStore {
    inner: MemoryStore,
    interference: Arc<Mutex<Option<(String, String, PhysicalRow)>>>,
}

impl RacingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            interference: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a concurrent write to land before the next update.
    pub fn interfere(&self, table: &str, id: &str, patch: PhysicalRow) {
        *self.interference.lock() = Some((table.to_string(), id.to_string(), patch));
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl RelationalStore for RacingStore {
    fn capability(&self) -> &Capability {
        self.inner.capability()
    }

    async fn select(&self, table: &str, query: &NativeQuery) -> StoreResult<Vec<PhysicalRow>> {
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, row: PhysicalRow) -> StoreResult<PhysicalRow> {
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, id: &str, patch: PhysicalRow) -> StoreResult<PhysicalRow> {
        let pending = self.interference.lock().take();
        if let Some((other_table, other_id, other_patch)) = pending {
            self.inner.update(&other_table, &other_id, other_patch).await?;
        }
        self.inner.update(table, id, patch).await
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(table, id).await
    }

    async fn count(&self, table: &str, filters: &[NativeFilter]) -> StoreResult<u64> {
        self.inner.count(table, filters).await
    }

    fn subscribe(&self, table: &str, listener: RowListener) -> StoreResult<ChannelId> {
        self.inner.subscribe(table, listener)
    }

    fn unsubscribe(&self, channel: ChannelId) -> StoreResult<()> {
        self.inner.unsubscribe(channel)
    }
}
