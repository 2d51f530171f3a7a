//! Document repository.
//!
//! The hierarchical-document operations callers use: get/find/list/count,
//! insert/set/update/delete, the read-modify-write field helpers, and the
//! subcollection emulation on top of them.

mod error;
#[allow(clippy::module_inception)]
mod repository;
mod subcollection;

pub use error::{DataError, DataResult};
pub use repository::DocumentRepository;
