//! Collection registry.

use std::collections::BTreeMap;

use super::config::{CatalogConfig, CollectionConfig, SubcollectionConfig};
use super::types::{CollectionDescriptor, Encoding, PhysicalLayout, SubcollectionRelation};
use crate::naming::{NameOverride, NameTranslator, OverrideError};

/// Catalog configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("collection name cannot be empty")]
    EmptyName,

    #[error("duplicate collection: {0}")]
    DuplicateCollection(String),

    #[error("duplicate subcollection: {parent}/{name}")]
    DuplicateSubcollection { parent: String, name: String },

    #[error("subcollection {parent}/{name} has no parent field")]
    MissingParentField { parent: String, name: String },

    #[error("field '{0}' collides with a bookkeeping column")]
    ReservedField(String),

    #[error("invalid name override: {0}")]
    Override(#[from] OverrideError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// The catalog resolves logical collection names to physical descriptors.
///
/// Registered collections resolve to their configured descriptor. Any other
/// top-level name resolves to the translated table name with the default
/// encoding. Subcollections must be registered.
#[derive(Debug, Clone)]
pub struct Catalog {
    layout: PhysicalLayout,
    translator: NameTranslator,
    default_encoding: Encoding,
    collections: BTreeMap<String, CollectionDescriptor>,
    subcollections: BTreeMap<(String, String), SubcollectionRelation>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            layout: PhysicalLayout::default(),
            translator: NameTranslator::new(),
            default_encoding: Encoding::default(),
            collections: BTreeMap::new(),
            subcollections: BTreeMap::new(),
        }
    }
}

impl Catalog {
    /// Build a catalog from a configuration.
    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        let translator = NameTranslator::with_overrides(config.overrides)?;
        let mut catalog = Self {
            layout: config.layout,
            translator,
            default_encoding: config.default_encoding,
            collections: BTreeMap::new(),
            subcollections: BTreeMap::new(),
        };

        for collection in config.collections {
            catalog.register(collection)?;
        }
        for sub in config.subcollections {
            catalog.register_subcollection(sub)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON configuration and build a catalog from it.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    fn register(&mut self, config: CollectionConfig) -> Result<(), CatalogError> {
        if config.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.collections.contains_key(&config.name) {
            return Err(CatalogError::DuplicateCollection(config.name));
        }

        let table = config
            .table
            .unwrap_or_else(|| self.translator.to_physical(&config.name));
        let mut descriptor = CollectionDescriptor::new(
            config.name.clone(),
            table,
            config.encoding.unwrap_or(self.default_encoding),
        );
        descriptor.optional = config.optional;

        self.collections.insert(config.name, descriptor);
        Ok(())
    }

    fn register_subcollection(&mut self, config: SubcollectionConfig) -> Result<(), CatalogError> {
        if config.parent.is_empty() || config.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if config.parent_field.is_empty() {
            return Err(CatalogError::MissingParentField {
                parent: config.parent,
                name: config.name,
            });
        }

        let column = self.translator.to_physical(&config.parent_field);
        if self.layout.is_reserved_column(&column) {
            return Err(CatalogError::ReservedField(config.parent_field));
        }

        let key = (config.parent.clone(), config.name.clone());
        if self.subcollections.contains_key(&key) {
            return Err(CatalogError::DuplicateSubcollection {
                parent: config.parent,
                name: config.name,
            });
        }

        let table = config
            .table
            .unwrap_or_else(|| self.translator.to_physical(&config.name));
        let descriptor = CollectionDescriptor::new(
            format!("{}/{}", config.parent, config.name),
            table,
            config.encoding.unwrap_or(self.default_encoding),
        )
        .with_parent_field(config.parent_field);

        self.subcollections.insert(
            key,
            SubcollectionRelation {
                parent: config.parent,
                name: config.name,
                descriptor,
            },
        );
        Ok(())
    }

    /// Resolve a top-level collection name.
    pub fn resolve(&self, collection: &str) -> CollectionDescriptor {
        match self.collections.get(collection) {
            Some(descriptor) => descriptor.clone(),
            None => CollectionDescriptor::new(
                collection,
                self.translator.to_physical(collection),
                self.default_encoding,
            ),
        }
    }

    /// Look up a registered subcollection.
    pub fn subcollection(&self, parent: &str, name: &str) -> Option<&SubcollectionRelation> {
        self.subcollections
            .get(&(parent.to_string(), name.to_string()))
    }

    /// Check if a collection is explicitly registered.
    pub fn is_registered(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    /// Registered collection names.
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// Registered subcollection relations.
    pub fn subcollections(&self) -> impl Iterator<Item = &SubcollectionRelation> {
        self.subcollections.values()
    }

    pub fn layout(&self) -> &PhysicalLayout {
        &self.layout
    }

    pub fn translator(&self) -> &NameTranslator {
        &self.translator
    }

    pub fn default_encoding(&self) -> Encoding {
        self.default_encoding
    }
}

/// Fluent builder for a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    config: CatalogConfig,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physical bookkeeping column names.
    pub fn layout(mut self, layout: PhysicalLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the encoding used when a collection names none.
    pub fn default_encoding(mut self, encoding: Encoding) -> Self {
        self.config.default_encoding = encoding;
        self
    }

    /// Add a paired name override.
    pub fn name_override(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        self.config
            .overrides
            .push(NameOverride::new(logical, physical));
        self
    }

    /// Register a collection.
    pub fn collection(mut self, collection: CollectionConfig) -> Self {
        self.config.collections.push(collection);
        self
    }

    /// Register a flat-columns collection under its translated table name.
    pub fn flat(self, name: impl Into<String>) -> Self {
        self.collection(CollectionConfig::new(name).encoding(Encoding::FlatColumns))
    }

    /// Register a single-JSON collection under its translated table name.
    pub fn json(self, name: impl Into<String>) -> Self {
        self.collection(CollectionConfig::new(name).encoding(Encoding::SingleJsonColumn))
    }

    /// Register a subcollection.
    pub fn subcollection(mut self, sub: SubcollectionConfig) -> Self {
        self.config.subcollections.push(sub);
        self
    }

    /// Build the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        Catalog::from_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        CatalogBuilder::new()
            .name_override("favs", "favorites")
            .flat("books")
            .json("bookCategories")
            .collection(
                CollectionConfig::new("appConfig")
                    .encoding(Encoding::SingleJsonColumn)
                    .optional(),
            )
            .subcollection(SubcollectionConfig::new("categories", "items", "categoryId"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_registered() {
        let catalog = sample_catalog();

        let books = catalog.resolve("books");
        assert_eq!(books.physical_table, "books");
        assert_eq!(books.encoding, Encoding::FlatColumns);
        assert!(!books.optional);

        let cats = catalog.resolve("bookCategories");
        assert_eq!(cats.physical_table, "book_categories");
        assert_eq!(cats.encoding, Encoding::SingleJsonColumn);

        assert!(catalog.resolve("appConfig").optional);
    }

    #[test]
    fn test_resolve_unregistered_is_lenient() {
        let catalog = sample_catalog();

        let favs = catalog.resolve("favs");
        assert_eq!(favs.physical_table, "favorites");
        assert_eq!(favs.encoding, Encoding::FlatColumns);
        assert!(!catalog.is_registered("favs"));

        let videos = catalog.resolve("dailyVideos");
        assert_eq!(videos.physical_table, "daily_videos");
    }

    #[test]
    fn test_subcollection_lookup() {
        let catalog = sample_catalog();

        let relation = catalog.subcollection("categories", "items").unwrap();
        assert_eq!(relation.descriptor.physical_table, "items");
        assert_eq!(relation.parent_field(), "categoryId");
        assert_eq!(relation.descriptor.logical_name, "categories/items");

        assert!(catalog.subcollection("books", "items").is_none());
        assert!(catalog.subcollection("categories", "books").is_none());
    }

    #[test]
    fn test_duplicate_collection() {
        let result = CatalogBuilder::new().flat("books").json("books").build();
        assert!(matches!(result, Err(CatalogError::DuplicateCollection(_))));
    }

    #[test]
    fn test_duplicate_subcollection() {
        let sub = SubcollectionConfig::new("categories", "items", "categoryId");
        let result = CatalogBuilder::new()
            .subcollection(sub.clone())
            .subcollection(sub)
            .build();
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateSubcollection { .. })
        ));
    }

    #[test]
    fn test_invalid_parent_field() {
        let result = CatalogBuilder::new()
            .subcollection(SubcollectionConfig::new("categories", "items", ""))
            .build();
        assert!(matches!(result, Err(CatalogError::MissingParentField { .. })));

        let result = CatalogBuilder::new()
            .subcollection(SubcollectionConfig::new("categories", "items", "createdAt"))
            .build();
        assert!(matches!(result, Err(CatalogError::ReservedField(_))));
    }

    #[test]
    fn test_conflicting_overrides() {
        let result = CatalogBuilder::new()
            .name_override("favs", "favorites")
            .name_override("favs", "favourites")
            .build();
        assert!(matches!(result, Err(CatalogError::Override(_))));
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(
            r#"{
                "layout": {"blob_column": "payload"},
                "collections": [{"name": "books", "table": "library_books"}]
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.layout().blob_column, "payload");
        assert_eq!(catalog.resolve("books").physical_table, "library_books");

        let result = Catalog::from_json("{not json");
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }
}
