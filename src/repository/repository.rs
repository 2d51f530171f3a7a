//! Document repository: hierarchical-document operations executed against a
//! relational store.
//!
//! Every operation resolves the logical collection through the [`Catalog`],
//! compiles or encodes through the collection's encoding, and talks to the
//! store with physical names only.
//!
//! # Concurrency
//!
//! Nothing here locks or carries a version token. Merge updates on
//! single-JSON collections, `increment`, `array_union` and `array_remove` are
//! read-modify-write sequences: two callers changing the same document at
//! the same time can overwrite each other. Stores that need atomic counters
//! must provide them natively.

use std::sync::Arc;

use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::error::{DataError, DataResult};
use crate::catalog::{Catalog, CollectionDescriptor};
use crate::codec::{now_timestamp, Document, DocumentCodec, DocumentId, Fields};
use crate::feed::ChangeFeed;
use crate::query::{Predicate, QueryCompiler, QuerySpec};
use crate::store::{NativeQuery, RelationalStore, StoreError};

/// The data-access entry point.
///
/// Cheap to clone; clones share the store client and catalog.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn RelationalStore>,
    catalog: Arc<Catalog>,
}

impl DocumentRepository {
    pub fn new(store: Arc<dyn RelationalStore>, catalog: Catalog) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn RelationalStore> {
        &self.store
    }

    /// Change feed over the same store and catalog.
    pub fn changes(&self) -> ChangeFeed {
        ChangeFeed::new(self.store.clone(), self.catalog.clone())
    }

    fn codec(&self) -> DocumentCodec<'_> {
        DocumentCodec::new(self.catalog.layout(), self.catalog.translator())
    }

    fn compiler(&self) -> QueryCompiler<'_> {
        QueryCompiler::new(self.catalog.layout(), self.catalog.translator())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch one document. A missing id is [`DataError::NotFound`].
    pub async fn get(&self, collection: &str, id: &str) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        self.get_in(&descriptor, id).await
    }

    /// Fetch one document if it exists.
    ///
    /// For optional collections an unprovisioned table reads as `None`.
    pub async fn find(&self, collection: &str, id: &str) -> DataResult<Option<Document>> {
        let descriptor = self.catalog.resolve(collection);
        let result = self.fetch(&descriptor, id).await;
        recover_optional(&descriptor, result, None)
    }

    pub async fn exists(&self, collection: &str, id: &str) -> DataResult<bool> {
        Ok(self.find(collection, id).await?.is_some())
    }

    /// Run a query and materialize the matching documents.
    ///
    /// Offset pagination is not stable under concurrent inserts.
    pub async fn list(&self, collection: &str, spec: &QuerySpec) -> DataResult<Vec<Document>> {
        let descriptor = self.catalog.resolve(collection);
        let result = self.list_in(&descriptor, spec).await;
        recover_optional(&descriptor, result, Vec::new())
    }

    /// Count documents matching `predicates`.
    ///
    /// Uses the store's count primitive when it has one, otherwise lists and
    /// counts.
    pub async fn count(&self, collection: &str, predicates: &[Predicate]) -> DataResult<u64> {
        let descriptor = self.catalog.resolve(collection);
        let result = self.count_in(&descriptor, predicates).await;
        recover_optional(&descriptor, result, 0)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a document. An `id` field is used as the document id;
    /// without one an id is generated.
    pub async fn insert(&self, collection: &str, fields: Fields) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        self.insert_in(&descriptor, fields).await
    }

    /// Insert under `id`, or merge into the existing document.
    pub async fn set(&self, collection: &str, id: &str, mut fields: Fields) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        let id = DocumentId::new(id)?;

        if fields.get("id").and_then(Value::as_str) == Some(id.as_str()) {
            fields.remove("id");
        }

        match self.fetch(&descriptor, id.as_str()).await? {
            Some(_) => self.update_in(&descriptor, id.as_str(), &fields).await,
            None => self.insert_with_id(&descriptor, &id, &fields).await,
        }
    }

    /// Merge `partial` into the document. Keys not in `partial` are kept.
    pub async fn update(&self, collection: &str, id: &str, partial: &Fields) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        self.update_in(&descriptor, id, partial).await
    }

    /// Delete a document. Deleting a missing document succeeds.
    pub async fn delete(&self, collection: &str, id: &str) -> DataResult<()> {
        let descriptor = self.catalog.resolve(collection);
        self.delete_in(&descriptor, id).await
    }

    /// Add `delta` to a numeric field (absent counts as 0). Integer and
    /// fractional deltas are both accepted; anything that is not a finite
    /// number fails with [`DataError::FieldType`] before the store is read.
    ///
    /// Read-modify-write; concurrent increments can be lost.
    pub async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: impl Into<Value>,
    ) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        // non-finite floats convert to null
        let delta = match delta.into() {
            Value::Number(delta) => delta,
            _ => {
                return Err(field_type(
                    &descriptor,
                    id,
                    field,
                    "a number (delta is not a finite number)",
                ))
            }
        };
        let document = self.get_in(&descriptor, id).await?;

        let next = match document.get(field) {
            None | Some(Value::Null) => Some(delta),
            Some(Value::Number(current)) => add_numbers(current, &delta),
            Some(_) => None,
        }
        .ok_or_else(|| field_type(&descriptor, id, field, "a number"))?;

        debug!(collection = %descriptor.logical_name, id, field, value = %next, "increment");
        self.update_in(&descriptor, id, &single(field, Value::Number(next)))
            .await
    }

    /// Append `value` to an array field unless it is already present.
    pub async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        let value = value.into();
        let document = self.get_in(&descriptor, id).await?;

        let mut items = array_field(&descriptor, &document, field)?;
        if !items.contains(&value) {
            items.push(value);
        }

        self.update_in(&descriptor, id, &single(field, Value::Array(items)))
            .await
    }

    /// Remove every occurrence of `value` from an array field.
    ///
    /// When nothing matches the document is returned untouched and nothing
    /// is written.
    pub async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> DataResult<Document> {
        let descriptor = self.catalog.resolve(collection);
        let value = value.into();
        let document = self.get_in(&descriptor, id).await?;

        let mut items = array_field(&descriptor, &document, field)?;
        let before = items.len();
        items.retain(|item| item != &value);
        if items.len() == before {
            return Ok(document);
        }

        self.update_in(&descriptor, id, &single(field, Value::Array(items)))
            .await
    }

    // =========================================================================
    // Descriptor-level operations, shared with the subcollection emulator
    // =========================================================================

    pub(crate) async fn fetch(
        &self,
        descriptor: &CollectionDescriptor,
        id: &str,
    ) -> DataResult<Option<Document>> {
        let id = DocumentId::new(id)?;
        let query = NativeQuery::by_id(&self.catalog.layout().id_column, id.as_str());
        debug!(collection = %descriptor.logical_name, table = %descriptor.physical_table, %query, "select");

        let rows = self
            .store
            .select(&descriptor.physical_table, &query)
            .await
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))?;

        match rows.first() {
            Some(row) => Ok(Some(self.codec().decode(descriptor, row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn get_in(
        &self,
        descriptor: &CollectionDescriptor,
        id: &str,
    ) -> DataResult<Document> {
        self.fetch(descriptor, id)
            .await?
            .ok_or_else(|| DataError::NotFound {
                collection: descriptor.logical_name.clone(),
                id: id.to_string(),
            })
    }

    pub(crate) async fn list_in(
        &self,
        descriptor: &CollectionDescriptor,
        spec: &QuerySpec,
    ) -> DataResult<Vec<Document>> {
        let query = self.compiler().compile(descriptor, spec)?;
        debug!(collection = %descriptor.logical_name, table = %descriptor.physical_table, %query, "select");

        let rows = self
            .store
            .select(&descriptor.physical_table, &query)
            .await
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))?;

        let codec = self.codec();
        let documents = rows
            .iter()
            .map(|row| codec.decode(descriptor, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    pub(crate) async fn count_in(
        &self,
        descriptor: &CollectionDescriptor,
        predicates: &[Predicate],
    ) -> DataResult<u64> {
        if !self.store.capability().native_count {
            let spec = QuerySpec {
                predicates: predicates.to_vec(),
                ..QuerySpec::default()
            };
            return Ok(self.list_in(descriptor, &spec).await?.len() as u64);
        }

        let filters = self.compiler().compile_filters(descriptor, predicates)?;
        debug!(
            collection = %descriptor.logical_name,
            table = %descriptor.physical_table,
            filters = filters.len(),
            "count"
        );

        self.store
            .count(&descriptor.physical_table, &filters)
            .await
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))
    }

    pub(crate) async fn insert_in(
        &self,
        descriptor: &CollectionDescriptor,
        mut fields: Fields,
    ) -> DataResult<Document> {
        let id = match fields.remove("id") {
            None | Some(Value::Null) => DocumentId::generate(),
            Some(Value::String(id)) => DocumentId::new(id)?,
            Some(other) => {
                return Err(field_type(descriptor, &other.to_string(), "id", "a string"));
            }
        };
        self.insert_with_id(descriptor, &id, &fields).await
    }

    async fn insert_with_id(
        &self,
        descriptor: &CollectionDescriptor,
        id: &DocumentId,
        fields: &Fields,
    ) -> DataResult<Document> {
        let codec = self.codec();
        let row = codec.encode_insert(descriptor, id, fields, &now_timestamp())?;
        debug!(collection = %descriptor.logical_name, table = %descriptor.physical_table, %id, "insert");

        let stored = self
            .store
            .insert(&descriptor.physical_table, row)
            .await
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))?;
        Ok(codec.decode(descriptor, &stored)?)
    }

    pub(crate) async fn update_in(
        &self,
        descriptor: &CollectionDescriptor,
        id: &str,
        partial: &Fields,
    ) -> DataResult<Document> {
        let id = DocumentId::new(id)?;
        let current = if descriptor.encoding.needs_read_before_write() {
            Some(self.get_in(descriptor, id.as_str()).await?)
        } else {
            None
        };

        let codec = self.codec();
        let patch = codec.encode_update(descriptor, current.as_ref(), partial, &now_timestamp())?;
        debug!(
            collection = %descriptor.logical_name,
            table = %descriptor.physical_table,
            %id,
            columns = patch.len(),
            "update"
        );

        match self
            .store
            .update(&descriptor.physical_table, id.as_str(), patch)
            .await
        {
            Ok(row) => Ok(codec.decode(descriptor, &row)?),
            Err(StoreError::RowNotFound { .. }) => Err(DataError::NotFound {
                collection: descriptor.logical_name.clone(),
                id: id.into_string(),
            }),
            Err(e) => Err(DataError::from_store(&descriptor.logical_name, e)),
        }
    }

    pub(crate) async fn delete_in(
        &self,
        descriptor: &CollectionDescriptor,
        id: &str,
    ) -> DataResult<()> {
        let id = DocumentId::new(id)?;
        debug!(collection = %descriptor.logical_name, table = %descriptor.physical_table, %id, "delete");

        self.store
            .delete(&descriptor.physical_table, id.as_str())
            .await
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))
    }
}

/// Optional collections read as empty until their table exists.
fn recover_optional<T>(
    descriptor: &CollectionDescriptor,
    result: DataResult<T>,
    empty: T,
) -> DataResult<T> {
    match result {
        Err(DataError::RelationNotProvisioned { ref table, .. }) if descriptor.optional => {
            warn!(
                collection = %descriptor.logical_name,
                table = %table,
                "relation not provisioned, reading optional collection as empty"
            );
            Ok(empty)
        }
        other => other,
    }
}

fn single(field: &str, value: Value) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field.to_string(), value);
    fields
}

fn array_field(
    descriptor: &CollectionDescriptor,
    document: &Document,
    field: &str,
) -> DataResult<Vec<Value>> {
    match document.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(field_type(descriptor, document.id.as_str(), field, "an array")),
    }
}

fn field_type(
    descriptor: &CollectionDescriptor,
    id: &str,
    field: &str,
    expected: &'static str,
) -> DataError {
    DataError::FieldType {
        collection: descriptor.logical_name.clone(),
        id: id.to_string(),
        field: field.to_string(),
        expected,
    }
}

/// Integer addition while both sides are integers and it fits, float
/// addition otherwise.
fn add_numbers(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(Number::from(sum));
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?)
}
