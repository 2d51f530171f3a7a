//! Collection descriptors and physical layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a collection's documents are laid out physically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One physical column per logical field.
    #[default]
    FlatColumns,
    /// All logical fields serialized into one JSON column; id, timestamps
    /// and any parent reference live in their own columns.
    SingleJsonColumn,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::FlatColumns => "flat_columns",
            Encoding::SingleJsonColumn => "single_json_column",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of the columns every physical table carries outside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalLayout {
    /// Primary key column.
    pub id_column: String,
    /// JSON payload column (single-JSON encoding only).
    pub blob_column: String,
    /// Creation timestamp column.
    pub created_column: String,
    /// Last update timestamp column.
    pub updated_column: String,
}

impl Default for PhysicalLayout {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            blob_column: "data".to_string(),
            created_column: "created_at".to_string(),
            updated_column: "updated_at".to_string(),
        }
    }
}

impl PhysicalLayout {
    /// Whether `column` is one of the bookkeeping columns.
    pub fn is_reserved_column(&self, column: &str) -> bool {
        column == self.id_column
            || column == self.blob_column
            || column == self.created_column
            || column == self.updated_column
    }
}

/// Resolved description of one logical collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    /// Name callers use (`bookCategories`).
    pub logical_name: String,
    /// Table the documents live in (`book_categories`).
    pub physical_table: String,
    pub encoding: Encoding,
    /// A missing relation reads as empty instead of failing.
    pub optional: bool,
    /// Logical field holding the parent document id, for subcollection
    /// tables. Always stored in its own column.
    pub parent_field: Option<String>,
}

impl CollectionDescriptor {
    pub fn new(
        logical_name: impl Into<String>,
        physical_table: impl Into<String>,
        encoding: Encoding,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            physical_table: physical_table.into(),
            encoding,
            optional: false,
            parent_field: None,
        }
    }

    /// Mark the collection as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the parent reference field.
    pub fn with_parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = Some(field.into());
        self
    }

    /// Whether `field` is stored in a dedicated column even under the
    /// single-JSON encoding.
    pub fn is_promoted(&self, field: &str) -> bool {
        self.parent_field.as_deref() == Some(field)
    }
}

impl fmt::Display for CollectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.logical_name, self.physical_table, self.encoding
        )?;
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}

/// A registered `(parent collection, subcollection)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcollectionRelation {
    pub parent: String,
    pub name: String,
    /// The flat table the subcollection is stored in. Its `parent_field` is
    /// always set.
    pub descriptor: CollectionDescriptor,
}

impl SubcollectionRelation {
    /// Logical field carrying the parent id.
    pub fn parent_field(&self) -> &str {
        self.descriptor.parent_field.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for SubcollectionRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{{id}}/{} -> {} by {}",
            self.parent,
            self.name,
            self.descriptor.physical_table,
            self.parent_field()
        )
    }
}
