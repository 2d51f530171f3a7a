//! Physical row <-> logical document conversion.
//!
//! Row shape per encoding, for `{id: "b1", title: "Alpha", categoryId: "c1"}`
//! in a subcollection table whose parent field is `categoryId`:
//!
//! ```text
//! FlatColumns:      { id, created_at, updated_at, title, category_id }
//! SingleJsonColumn: { id, created_at, updated_at, category_id,
//!                     data: { "title": "Alpha" } }
//! ```
//!
//! Merge updates are asymmetric. Flat columns are patched in place: only the
//! supplied columns are written. A JSON payload is opaque to the store, so
//! the whole payload is rewritten from the current document merged with the
//! patch. Two writers that read the same payload concurrently therefore lose
//! one of their updates.

use serde_json::Value;

use super::document::{Document, DocumentId, Fields};
use super::error::{CodecError, CodecResult};
use crate::catalog::{CollectionDescriptor, Encoding, PhysicalLayout};
use crate::naming::NameTranslator;
use crate::store::PhysicalRow;

impl Encoding {
    /// Whether a merge update must read the current row first.
    pub fn needs_read_before_write(&self) -> bool {
        matches!(self, Encoding::SingleJsonColumn)
    }
}

/// Encodes and decodes documents for one catalog's layout and naming rules.
#[derive(Debug, Clone, Copy)]
pub struct DocumentCodec<'a> {
    layout: &'a PhysicalLayout,
    translator: &'a NameTranslator,
}

impl<'a> DocumentCodec<'a> {
    pub fn new(layout: &'a PhysicalLayout, translator: &'a NameTranslator) -> Self {
        Self { layout, translator }
    }

    /// Physical row -> logical document.
    ///
    /// A NULL flat column decodes as an absent field, so `{x: null}` stored
    /// flat reads back without `x`. Nulls inside a JSON payload are kept.
    pub fn decode(&self, collection: &CollectionDescriptor, row: &PhysicalRow) -> CodecResult<Document> {
        let id = match row.get(&self.layout.id_column) {
            Some(Value::String(s)) => DocumentId::new(s.clone())?,
            Some(Value::Number(n)) => DocumentId::new(n.to_string())?,
            _ => {
                return Err(CodecError::MissingId {
                    table: collection.physical_table.clone(),
                })
            }
        };

        let mut fields = Fields::new();
        match collection.encoding {
            Encoding::FlatColumns => {
                for (column, value) in row {
                    if self.layout.is_reserved_column(column) || value.is_null() {
                        continue;
                    }
                    fields.insert(self.translator.to_logical(column), value.clone());
                }
            }
            Encoding::SingleJsonColumn => {
                fields = self.decode_blob(collection, row.get(&self.layout.blob_column))?;

                if let Some(parent_field) = &collection.parent_field {
                    let column = self.translator.to_physical(parent_field);
                    if let Some(value) = row.get(&column).filter(|v| !v.is_null()) {
                        fields.insert(parent_field.clone(), value.clone());
                    }
                }
            }
        }

        Ok(Document {
            id,
            fields,
            created_at: timestamp(row.get(&self.layout.created_column)),
            updated_at: timestamp(row.get(&self.layout.updated_column)),
        })
    }

    fn decode_blob(
        &self,
        collection: &CollectionDescriptor,
        blob: Option<&Value>,
    ) -> CodecResult<Fields> {
        let invalid = |reason: String| CodecError::InvalidBlob {
            table: collection.physical_table.clone(),
            reason,
        };

        match blob {
            None | Some(Value::Null) => Ok(Fields::new()),
            Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
            // some clients hand json columns back as text
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text)? {
                Value::Object(map) => Ok(map.into_iter().collect()),
                other => Err(invalid(format!("expected an object, found {}", other))),
            },
            Some(other) => Err(invalid(format!("expected an object, found {}", other))),
        }
    }

    /// Logical fields -> complete row for insert.
    pub fn encode_insert(
        &self,
        collection: &CollectionDescriptor,
        id: &DocumentId,
        fields: &Fields,
        now: &str,
    ) -> CodecResult<PhysicalRow> {
        self.check_fields(collection, fields)?;

        let mut row = PhysicalRow::new();
        row.insert(self.layout.id_column.clone(), Value::String(id.as_str().to_string()));
        row.insert(self.layout.created_column.clone(), Value::String(now.to_string()));
        row.insert(self.layout.updated_column.clone(), Value::String(now.to_string()));

        match collection.encoding {
            Encoding::FlatColumns => self.write_columns(&mut row, fields),
            Encoding::SingleJsonColumn => self.write_blob(collection, &mut row, fields),
        }
        Ok(row)
    }

    /// Partial logical fields -> update patch.
    ///
    /// `current` is required for single-JSON collections (see
    /// [`Encoding::needs_read_before_write`]) and ignored otherwise.
    pub fn encode_update(
        &self,
        collection: &CollectionDescriptor,
        current: Option<&Document>,
        partial: &Fields,
        now: &str,
    ) -> CodecResult<PhysicalRow> {
        self.check_fields(collection, partial)?;

        let mut patch = PhysicalRow::new();
        patch.insert(self.layout.updated_column.clone(), Value::String(now.to_string()));

        match collection.encoding {
            Encoding::FlatColumns => self.write_columns(&mut patch, partial),
            Encoding::SingleJsonColumn => {
                let current = current.ok_or_else(|| CodecError::MissingCurrent {
                    table: collection.physical_table.clone(),
                })?;
                let merged = merge_fields(&current.fields, partial);
                self.write_blob(collection, &mut patch, &merged);
            }
        }
        Ok(patch)
    }

    /// Reject fields that would land on a bookkeeping column, and fields
    /// stored in their own column whose name does not translate back to
    /// itself.
    ///
    /// A translation round trip is injective: two distinct names that both
    /// survive it never share a column.
    fn check_fields(&self, collection: &CollectionDescriptor, fields: &Fields) -> CodecResult<()> {
        for field in fields.keys() {
            let column = self.translator.to_physical(field);
            if field == "id" || self.layout.is_reserved_column(&column) {
                return Err(CodecError::ReservedField(field.clone()));
            }

            let own_column =
                collection.encoding == Encoding::FlatColumns || collection.is_promoted(field);
            if own_column && self.translator.to_logical(&column) != *field {
                return Err(CodecError::IrreversibleName {
                    field: field.clone(),
                    column,
                });
            }
        }
        Ok(())
    }

    fn write_columns(&self, row: &mut PhysicalRow, fields: &Fields) {
        for (field, value) in fields {
            row.insert(self.translator.to_physical(field), value.clone());
        }
    }

    fn write_blob(&self, collection: &CollectionDescriptor, row: &mut PhysicalRow, fields: &Fields) {
        let mut blob = serde_json::Map::new();
        for (field, value) in fields {
            if collection.is_promoted(field) {
                row.insert(self.translator.to_physical(field), value.clone());
            } else {
                blob.insert(field.clone(), value.clone());
            }
        }
        row.insert(self.layout.blob_column.clone(), Value::Object(blob));
    }
}

/// Shallow merge: every key of `partial` replaces the key in `current`.
pub fn merge_fields(current: &Fields, partial: &Fields) -> Fields {
    let mut merged = current.clone();
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn timestamp(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}
