//! Serializable data-layer configuration.
//!
//! ```json
//! {
//!   "default_encoding": "flat_columns",
//!   "overrides": [{ "logical": "favs", "physical": "favorites" }],
//!   "collections": [
//!     { "name": "books" },
//!     { "name": "appConfig", "encoding": "single_json_column", "optional": true }
//!   ],
//!   "subcollections": [
//!     { "parent": "categories", "name": "items", "parent_field": "categoryId" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::types::{Encoding, PhysicalLayout};
use crate::naming::NameOverride;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub layout: PhysicalLayout,
    /// Encoding for collections that don't name one, registered or not.
    pub default_encoding: Encoding,
    pub overrides: Vec<NameOverride>,
    pub collections: Vec<CollectionConfig>,
    pub subcollections: Vec<SubcollectionConfig>,
}

/// One top-level collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Physical table; defaults to the translated collection name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub optional: bool,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            encoding: None,
            optional: false,
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// One `(parent, subcollection)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcollectionConfig {
    pub parent: String,
    pub name: String,
    /// Logical field that holds the parent document id.
    pub parent_field: String,
    /// Physical table; defaults to the translated subcollection name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
}

impl SubcollectionConfig {
    pub fn new(
        parent: impl Into<String>,
        name: impl Into<String>,
        parent_field: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
            parent_field: parent_field.into(),
            table: None,
            encoding: None,
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}
