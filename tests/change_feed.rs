//! Change feed subscriptions through the repository.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use reldoc::feed::{ChangeEvent, ChangeKind};
use reldoc::repository::DocumentRepository;
use reldoc::store::{
    Capability, ChannelId, MemoryStore, NativeQuery, PhysicalRow, RelationalStore, RowChange,
    RowChangeKind, RowListener, StoreResult,
};
use serde_json::json;

use common::{catalog, fields, repository, row};

fn recorder() -> (Arc<Mutex<Vec<ChangeEvent>>>, impl Fn(ChangeEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |event| sink.lock().push(event))
}

#[tokio::test]
async fn test_events_follow_writes() {
    let (_store, repo) = repository();
    let (events, on_event) = recorder();
    let _subscription = repo.changes().subscribe("books", on_event).unwrap();

    repo.insert("books", fields(json!({"id": "b1", "title": "Alpha"})))
        .await
        .unwrap();
    repo.update("books", "b1", &fields(json!({"title": "Beta"})))
        .await
        .unwrap();
    repo.delete("books", "b1").await.unwrap();

    let events = events.lock();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]);

    let updated = events[1].new_document.as_ref().unwrap();
    assert_eq!(updated.to_value(), json!({"id": "b1", "title": "Beta"}));
    assert_eq!(events[1].old_document.as_ref().unwrap().get("title"), Some(&json!("Alpha")));
    assert_eq!(events[2].new_document, None);
}

#[tokio::test]
async fn test_json_events_are_decoded_to_logical_fields() {
    let (_store, repo) = repository();
    let (events, on_event) = recorder();
    let _subscription = repo.changes().subscribe("notes", on_event).unwrap();

    repo.insert("notes", fields(json!({"id": "n1", "pinned": true})))
        .await
        .unwrap();

    let events = events.lock();
    assert_eq!(
        events[0].document().unwrap().to_value(),
        json!({"id": "n1", "pinned": true})
    );
}

#[tokio::test]
async fn test_subscribers_are_independent() {
    let (store, repo) = repository();
    let feed = repo.changes();
    let (first_events, first_cb) = recorder();
    let (second_events, second_cb) = recorder();

    let first = feed.subscribe("books", first_cb).unwrap();
    let second = feed.subscribe("books", second_cb).unwrap();
    assert_ne!(first.channel(), second.channel());

    repo.insert("books", fields(json!({"id": "b1"}))).await.unwrap();
    first.unsubscribe().unwrap();
    first.unsubscribe().unwrap();
    repo.insert("books", fields(json!({"id": "b2"}))).await.unwrap();

    assert_eq!(first_events.lock().len(), 1);
    assert_eq!(second_events.lock().len(), 2);
    assert_eq!(store.channel_count(), 1);

    drop(second);
    assert_eq!(store.channel_count(), 0);
}

#[tokio::test]
async fn test_no_replay_of_earlier_changes() {
    let (_store, repo) = repository();
    repo.insert("books", fields(json!({"id": "b0"}))).await.unwrap();

    let (events, on_event) = recorder();
    let _subscription = repo.changes().subscribe("books", on_event).unwrap();
    assert!(events.lock().is_empty());
}

/// Keeps delivering to channels after they are closed, the way a store
/// with an event already in flight does.
#[derive(Clone, Default)]
struct StickyStore {
    inner: MemoryStore,
    listeners: Arc<Mutex<Vec<RowListener>>>,
}

impl StickyStore {
    fn fire(&self, change: &RowChange) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener(change);
        }
    }
}

#[async_trait]
impl RelationalStore for StickyStore {
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
        self.inner.update(table, id, patch).await
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(table, id).await
    }

    fn subscribe(&self, _table: &str, listener: RowListener) -> StoreResult<ChannelId> {
        let mut listeners = self.listeners.lock();
        listeners.push(listener);
        Ok(ChannelId(listeners.len() as u64))
    }

    fn unsubscribe(&self, _channel: ChannelId) -> StoreResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_late_event_after_unsubscribe_is_dropped() {
    let store = StickyStore::default();
    let repo = DocumentRepository::new(Arc::new(store.clone()), catalog());
    let (events, on_event) = recorder();

    let subscription = repo.changes().subscribe("books", on_event).unwrap();
    let change = RowChange {
        table: "books".into(),
        kind: RowChangeKind::Insert,
        new: Some(row(json!({"id": "b1", "title": "Alpha"}))),
        old: None,
    };

    store.fire(&change);
    subscription.unsubscribe().unwrap();
    store.fire(&change);

    assert_eq!(events.lock().len(), 1);
}
