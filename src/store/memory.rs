//! In-process relational store.
//!
//! `MemoryStore` implements the full `RelationalStore` contract over
//! insertion-ordered vectors of rows. Tables must be provisioned explicitly;
//! anything else answers `RelationNotProvisioned`, the way a hosted store
//! answers for a table that was never migrated.
//!
//! JSON-path filters follow `->>` text extraction: booleans and nested values
//! come back as text, strings stay strings, numbers stay numbers.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::client::{
    Capability, ChannelId, PhysicalRow, RelationalStore, RowChange, RowChangeKind, RowListener,
};
use super::error::{StoreError, StoreResult};
use super::native::{Comparison, FieldRef, NativeFilter, NativeQuery, NativeSort};

/// In-memory relational store.
///
/// Clone this to share it - it uses Arc internally.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    tables: RwLock<HashMap<String, Vec<PhysicalRow>>>,
    channels: RwLock<HashMap<ChannelId, (String, RowListener)>>,
    next_channel: AtomicU64,
    id_column: String,
    capability: Capability,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store with an `id` primary-key column and full capabilities.
    pub fn new() -> Self {
        Self::with_options("id", Capability::FULL)
    }

    /// Store with a custom primary-key column and capability set.
    pub fn with_options(id_column: impl Into<String>, capability: Capability) -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                tables: RwLock::new(HashMap::new()),
                channels: RwLock::new(HashMap::new()),
                next_channel: AtomicU64::new(1),
                id_column: id_column.into(),
                capability,
            }),
        }
    }

    /// Provision an empty table. Provisioning an existing table is a no-op.
    pub fn create_table(&self, table: impl Into<String>) {
        self.inner.tables.write().entry(table.into()).or_default();
    }

    /// Drop a table and all its rows.
    pub fn drop_table(&self, table: &str) {
        self.inner.tables.write().remove(table);
    }

    /// Check if a table is provisioned.
    pub fn table_exists(&self, table: &str) -> bool {
        self.inner.tables.read().contains_key(table)
    }

    /// Snapshot of all rows in a table, in insertion order.
    pub fn rows(&self, table: &str) -> StoreResult<Vec<PhysicalRow>> {
        self.inner
            .tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| not_provisioned(table))
    }

    /// Number of open change channels.
    pub fn channel_count(&self) -> usize {
        self.inner.channels.read().len()
    }

    fn row_id<'a>(&self, row: &'a PhysicalRow) -> Option<&'a str> {
        row.get(&self.inner.id_column).and_then(Value::as_str)
    }

    /// Deliver a change to every channel on its table, outside the table lock.
    fn publish(&self, change: RowChange) {
        let listeners: Vec<RowListener> = self
            .inner
            .channels
            .read()
            .values()
            .filter(|(table, _)| table == &change.table)
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&change);
        }
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    fn capability(&self) -> &Capability {
        &self.inner.capability
    }

    async fn select(&self, table: &str, query: &NativeQuery) -> StoreResult<Vec<PhysicalRow>> {
        let tables = self.inner.tables.read();
        let rows = tables.get(table).ok_or_else(|| not_provisioned(table))?;

        let mut selected: Vec<PhysicalRow> = rows
            .iter()
            .filter(|row| matches_all(&query.filters, row))
            .cloned()
            .collect();
        drop(tables);

        if !query.sort.is_empty() {
            // stable: ties keep insertion order
            selected.sort_by(|a, b| compare_rows(&query.sort, a, b));
        }

        if let Some(range) = query.range {
            let window = selected.into_iter().skip(range.offset);
            selected = match range.limit {
                Some(limit) => window.take(limit).collect(),
                None => window.collect(),
            };
        }

        Ok(selected)
    }

    async fn insert(&self, table: &str, row: PhysicalRow) -> StoreResult<PhysicalRow> {
        let id = self
            .row_id(&row)
            .ok_or_else(|| {
                StoreError::SchemaViolation(format!(
                    "row for {} is missing primary key column '{}'",
                    table, self.inner.id_column
                ))
            })?
            .to_string();

        {
            let mut tables = self.inner.tables.write();
            let rows = tables.get_mut(table).ok_or_else(|| not_provisioned(table))?;

            if rows.iter().any(|r| self.row_id(r) == Some(id.as_str())) {
                return Err(StoreError::RowAlreadyExists {
                    table: table.to_string(),
                    id,
                });
            }
            rows.push(row.clone());
        }

        self.publish(RowChange {
            table: table.to_string(),
            kind: RowChangeKind::Insert,
            new: Some(row.clone()),
            old: None,
        });
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: PhysicalRow) -> StoreResult<PhysicalRow> {
        let (old, new) = {
            let mut tables = self.inner.tables.write();
            let rows = tables.get_mut(table).ok_or_else(|| not_provisioned(table))?;

            let row = rows
                .iter_mut()
                .find(|r| self.row_id(r) == Some(id))
                .ok_or_else(|| StoreError::RowNotFound {
                    table: table.to_string(),
                    id: id.to_string(),
                })?;

            let old = row.clone();
            for (column, value) in patch {
                // the primary key is immutable
                if column != self.inner.id_column {
                    row.insert(column, value);
                }
            }
            (old, row.clone())
        };

        self.publish(RowChange {
            table: table.to_string(),
            kind: RowChangeKind::Update,
            new: Some(new.clone()),
            old: Some(old),
        });
        Ok(new)
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        let removed = {
            let mut tables = self.inner.tables.write();
            let rows = tables.get_mut(table).ok_or_else(|| not_provisioned(table))?;
            let position = rows.iter().position(|r| self.row_id(r) == Some(id));
            position.map(|p| rows.remove(p))
        };

        if let Some(old) = removed {
            self.publish(RowChange {
                table: table.to_string(),
                kind: RowChangeKind::Delete,
                new: None,
                old: Some(old),
            });
        }
        Ok(())
    }

    async fn count(&self, table: &str, filters: &[NativeFilter]) -> StoreResult<u64> {
        if !self.inner.capability.native_count {
            return Err(StoreError::Unsupported(format!("count on {}", table)));
        }

        let tables = self.inner.tables.read();
        let rows = tables.get(table).ok_or_else(|| not_provisioned(table))?;
        Ok(rows.iter().filter(|row| matches_all(filters, row)).count() as u64)
    }

    fn subscribe(&self, table: &str, listener: RowListener) -> StoreResult<ChannelId> {
        if !self.table_exists(table) {
            return Err(not_provisioned(table));
        }

        let channel = ChannelId(self.inner.next_channel.fetch_add(1, AtomicOrdering::Relaxed));
        self.inner
            .channels
            .write()
            .insert(channel, (table.to_string(), listener));
        Ok(channel)
    }

    fn unsubscribe(&self, channel: ChannelId) -> StoreResult<()> {
        self.inner.channels.write().remove(&channel);
        Ok(())
    }
}

fn not_provisioned(table: &str) -> StoreError {
    StoreError::RelationNotProvisioned {
        table: table.to_string(),
    }
}

/// Resolve a field reference against a row.
///
/// `None` stands for SQL NULL: a missing column, a missing JSON key, or a
/// JSON null.
fn extract(target: &FieldRef, row: &PhysicalRow) -> Option<Value> {
    match target {
        FieldRef::Column(name) => row.get(name).filter(|v| !v.is_null()).cloned(),
        FieldRef::JsonText { column, key } => {
            let value = row.get(column)?.as_object()?.get(key)?;
            match value {
                Value::Null => None,
                Value::Bool(b) => Some(Value::String(b.to_string())),
                Value::Array(_) | Value::Object(_) => Some(Value::String(value.to_string())),
                Value::String(_) | Value::Number(_) => Some(value.clone()),
            }
        }
    }
}

fn matches_all(filters: &[NativeFilter], row: &PhysicalRow) -> bool {
    filters.iter().all(|filter| matches_filter(filter, row))
}

/// Comparisons against NULL are never true, not even `neq`.
fn matches_filter(filter: &NativeFilter, row: &PhysicalRow) -> bool {
    let Some(actual) = extract(&filter.target, row) else {
        return false;
    };
    if filter.value.is_null() {
        return false;
    }

    match filter.comparison {
        Comparison::Eq => values_equal(&actual, &filter.value),
        Comparison::Neq => !values_equal(&actual, &filter.value),
        Comparison::Gt => compare_values(&actual, &filter.value) == Some(Ordering::Greater),
        Comparison::Gte => matches!(
            compare_values(&actual, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparison::Lt => compare_values(&actual, &filter.value) == Some(Ordering::Less),
        Comparison::Lte => matches!(
            compare_values(&actual, &filter.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Check if two JSON values are equal. Values of different JSON types never
/// are: `true` does not equal `"true"`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map(|(x, y)| x == y)
            .unwrap_or(false),
        _ => a == b,
    }
}

/// Order two scalars of the same JSON type; `None` across types.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// NULLs sort last in both directions.
fn compare_rows(sort: &[NativeSort], a: &PhysicalRow, b: &PhysicalRow) -> Ordering {
    for key in sort {
        let ordering = match (extract(&key.target, a), extract(&key.target, b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ordering = compare_values(&x, &y).unwrap_or(Ordering::Equal);
                if key.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
