//! Native query primitives understood by a relational store client.
//!
//! These are the physical-side vocabulary: column references, JSON-path text
//! extraction, comparison primitives, sort keys and a range. The query
//! compiler produces them; store implementations consume them.

use std::fmt;

use serde_json::Value;

/// What a filter or sort key addresses in a physical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// A real column.
    Column(String),
    /// Text extraction of a top-level key from a JSON column (`column->>key`).
    ///
    /// Extraction always yields text for booleans and nested values, so
    /// comparisons against booleans must use `"true"`/`"false"`.
    JsonText { column: String, key: String },
}

impl FieldRef {
    pub fn column(name: impl Into<String>) -> Self {
        FieldRef::Column(name.into())
    }

    pub fn json_text(column: impl Into<String>, key: impl Into<String>) -> Self {
        FieldRef::JsonText {
            column: column.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Column(name) => write!(f, "{}", name),
            FieldRef::JsonText { column, key } => write!(f, "{}->>{}", column, key),
        }
    }
}

/// Native comparison primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// PostgREST-style operator name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Neq => "neq",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `target <comparison> value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFilter {
    pub target: FieldRef,
    pub comparison: Comparison,
    pub value: Value,
}

impl NativeFilter {
    pub fn new(target: FieldRef, comparison: Comparison, value: Value) -> Self {
        Self {
            target,
            comparison,
            value,
        }
    }

    /// Equality on a plain column.
    pub fn column_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(FieldRef::column(column), Comparison::Eq, value.into())
    }
}

impl fmt::Display for NativeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target, self.comparison, self.value)
    }
}

/// A sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSort {
    pub target: FieldRef,
    pub ascending: bool,
}

impl fmt::Display for NativeSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "asc" } else { "desc" };
        write!(f, "{}.{}", self.target, dir)
    }
}

/// Row window: skip `offset` rows, then take at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "{}..{}", self.offset, self.offset.saturating_add(limit)),
            None => write!(f, "{}..", self.offset),
        }
    }
}

/// A compiled, store-ready query against one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeQuery {
    /// Conjunction of filters; empty means every row.
    pub filters: Vec<NativeFilter>,
    /// Sort keys in priority order.
    pub sort: Vec<NativeSort>,
    pub range: Option<Range>,
}

impl NativeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select one row by primary key.
    pub fn by_id(id_column: &str, id: &str) -> Self {
        Self {
            filters: vec![NativeFilter::column_eq(id_column, id)],
            sort: Vec::new(),
            range: Some(Range {
                offset: 0,
                limit: Some(1),
            }),
        }
    }
}

impl fmt::Display for NativeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<String> = self.filters.iter().map(|x| x.to_string()).collect();
        if filters.is_empty() {
            write!(f, "where=*")?;
        } else {
            write!(f, "where={}", filters.join(" and "))?;
        }

        if !self.sort.is_empty() {
            let sort: Vec<String> = self.sort.iter().map(|s| s.to_string()).collect();
            write!(f, " order={}", sort.join(","))?;
        }

        if let Some(range) = self.range {
            write!(f, " range={}", range)?;
        }
        Ok(())
    }
}
