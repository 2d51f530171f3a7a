//! reldoc - A hierarchical document layer over relational stores
//!
//! Callers keep the document-store vocabulary (collections, documents,
//! `where`/`orderBy`/`limit`, subcollections, array unions, live
//! subscriptions) while the rows live in relational tables. Each collection
//! is stored either as one column per field or as a single JSON payload
//! column, and the layer translates names, queries and documents for
//! whichever encoding the catalog assigns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use reldoc::catalog::CatalogBuilder;
//! use reldoc::codec::fields_from_value;
//! use reldoc::query::{Operator, QuerySpec};
//! use reldoc::repository::DocumentRepository;
//! use reldoc::store::MemoryStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.create_table("books");
//!
//! let catalog = CatalogBuilder::new().json("books").build()?;
//! let repo = DocumentRepository::new(Arc::new(store), catalog);
//!
//! let fields = fields_from_value(serde_json::json!({"title": "Alpha", "published": true}))
//!     .unwrap_or_default();
//! repo.insert("books", fields).await?;
//!
//! let published = repo
//!     .list("books", &QuerySpec::new().filter("published", Operator::Eq, true))
//!     .await?;
//! assert_eq!(published.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod codec;
pub mod feed;
pub mod naming;
pub mod query;
pub mod repository;
pub mod store;

pub use catalog::{Catalog, CatalogBuilder, Encoding};
pub use codec::{Document, DocumentId, Fields};
pub use query::{Operator, QuerySpec};
pub use repository::{DataError, DataResult, DocumentRepository};
