//! store client layer
//!
//! This module defines the collaborator interfaces the data layer executes
//! against, the native query primitives they accept, and in-process
//! implementations of both.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              DocumentRepository              │
//! │     (logical names, documents, queries)      │
//! └──────────────────────────────────────────────┘
//!                        │ NativeQuery / PhysicalRow
//!                        ▼
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │   RelationalStore    │   │      BlobStore       │
//! │ select/insert/update │   │  upload/public_url   │
//! │ delete/count/channels│   │                      │
//! └──────────────────────┘   └──────────────────────┘
//!            │                          │
//!            ▼                          ▼
//!      MemoryStore / your client   MemoryBlobStore / your client
//! ```

mod blob;
mod client;
mod error;
mod memory;
mod native;

pub use blob::{MemoryBlobStore, StoredObject};
pub use client::{
    BlobStore, Capability, ChannelId, PhysicalRow, RelationalStore, RowChange, RowChangeKind,
    RowListener,
};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use native::{Comparison, FieldRef, NativeFilter, NativeQuery, NativeSort, Range};
