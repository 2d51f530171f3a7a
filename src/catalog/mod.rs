//! Catalog module for collection registration.
//!
//! The catalog maps logical collection names onto physical tables and
//! encodings, and holds the static registry of subcollection pairs.

mod config;
mod manager;
mod types;

pub use config::{CatalogConfig, CollectionConfig, SubcollectionConfig};
pub use manager::{Catalog, CatalogBuilder, CatalogError};
pub use types::{CollectionDescriptor, Encoding, PhysicalLayout, SubcollectionRelation};
