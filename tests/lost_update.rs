//! Read-modify-write paths have no concurrency control. These tests pin the
//! lost-update behavior down so it stays documented rather than accidental.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use reldoc::repository::DocumentRepository;
use reldoc::store::Capability;
use serde_json::json;

use common::{catalog, fields, provisioned_store, row, RacingStore};

fn racing_repository() -> (RacingStore, DocumentRepository) {
    let store = RacingStore::new(provisioned_store(Capability::FULL));
    let repo = DocumentRepository::new(Arc::new(store.clone()), catalog());
    (store, repo)
}

#[tokio::test]
async fn test_json_update_loses_concurrent_write() {
    let (store, repo) = racing_repository();
    repo.insert("notes", fields(json!({"id": "n1", "title": "Alpha"})))
        .await
        .unwrap();

    // another client rewrites the payload after our read
    store.interfere(
        "notes",
        "n1",
        row(json!({"data": {"title": "Alpha", "note": "theirs"}})),
    );
    repo.update("notes", "n1", &fields(json!({"title": "Beta"})))
        .await
        .unwrap();

    let doc = repo.get("notes", "n1").await.unwrap();
    assert_eq!(doc.to_value(), json!({"id": "n1", "title": "Beta"}));
}

#[tokio::test]
async fn test_flat_update_keeps_disjoint_concurrent_write() {
    let (store, repo) = racing_repository();
    repo.insert("books", fields(json!({"id": "b1", "title": "Alpha"})))
        .await
        .unwrap();

    store.interfere("books", "b1", row(json!({"note": "theirs"})));
    repo.update("books", "b1", &fields(json!({"title": "Beta"})))
        .await
        .unwrap();

    let doc = repo.get("books", "b1").await.unwrap();
    assert_eq!(
        doc.to_value(),
        json!({"id": "b1", "title": "Beta", "note": "theirs"})
    );
}

#[tokio::test]
async fn test_concurrent_increment_is_lost() {
    let (store, repo) = racing_repository();

    for collection in ["books", "notes"] {
        repo.insert(collection, fields(json!({"id": "c1", "views": 0})))
            .await
            .unwrap();

        let concurrent = match collection {
            "books" => row(json!({"views": 1})),
            _ => row(json!({"data": {"views": 1}})),
        };
        store.interfere(collection, "c1", concurrent);

        let doc = repo.increment(collection, "c1", "views", 1).await.unwrap();
        // two increments happened, one survived
        assert_eq!(doc.get("views"), Some(&json!(1)), "{}", collection);
    }
}

#[tokio::test]
async fn test_without_interference_nothing_is_lost() {
    let (store, repo) = racing_repository();
    repo.insert("notes", fields(json!({"id": "n1", "views": 0})))
        .await
        .unwrap();

    repo.increment("notes", "n1", "views", 1).await.unwrap();
    repo.increment("notes", "n1", "views", 1).await.unwrap();
    let doc = repo.get("notes", "n1").await.unwrap();
    assert_eq!(doc.get("views"), Some(&json!(2)));
    assert_eq!(store.inner().rows("notes").unwrap().len(), 1);
}
