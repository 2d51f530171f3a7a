//! Logical documents and their identifiers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical fields of a document, keyed by logical name.
pub type Fields = BTreeMap<String, Value>;

/// A validated document id.
///
/// Ids are immutable once assigned. Generated ids are lowercase ULIDs: a
/// 48-bit millisecond timestamp followed by 80 random bits, so they are
/// collision resistant without a round trip to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), InvalidIdError> {
        if id.is_empty() {
            return Err(InvalidIdError::Empty);
        }

        if id.len() > 128 {
            return Err(InvalidIdError::TooLong(id.len()));
        }

        // a slash would read as a path segment
        if let Some(position) = id.find('/') {
            return Err(InvalidIdError::InvalidCharacter { char: '/', position });
        }

        Ok(())
    }

    /// Generate a new ULID-based id.
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// error type for invalid document ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdError {
    Empty,
    TooLong(usize),
    InvalidCharacter { char: char, position: usize },
}

impl fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "id cannot be empty"),
            Self::TooLong(len) => write!(f, "id too long: {} characters", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
        }
    }
}

impl std::error::Error for InvalidIdError {}

/// A document as callers see it: an id plus logical fields.
///
/// Store-managed timestamps are kept beside the fields, never inside them.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
    /// Creation timestamp (RFC 3339), when the store returned one.
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339), when the store returned one.
    pub updated_at: Option<String>,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self {
            id,
            fields,
            created_at: None,
            updated_at: None,
        }
    }

    /// get a field value by logical name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// check if the document has a field
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The hierarchical-store shape: `{ "id": ..., ...fields }`.
    pub fn to_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("id".to_string(), Value::String(self.id.as_str().to_string()));
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Same id and fields, ignoring timestamps.
    pub fn same_content(&self, other: &Document) -> bool {
        self.id == other.id && self.fields == other.fields
    }
}

/// Convert a JSON object into logical fields.
pub fn fields_from_value(value: Value) -> Option<Fields> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_valid() {
        assert!(DocumentId::new("u1").is_ok());
        assert!(DocumentId::new("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(DocumentId::new("with space").is_ok());
    }

    #[test]
    fn test_id_invalid() {
        assert_eq!(DocumentId::new(""), Err(InvalidIdError::Empty));
        assert_eq!(DocumentId::new("a".repeat(129)), Err(InvalidIdError::TooLong(129)));
        assert_eq!(
            DocumentId::new("books/b1"),
            Err(InvalidIdError::InvalidCharacter { char: '/', position: 5 })
        );
    }

    #[test]
    fn test_id_generate() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
        assert_eq!(a.as_str(), a.as_str().to_lowercase());
    }

    #[test]
    fn test_to_value() {
        let mut fields = Fields::new();
        fields.insert("title".into(), json!("Alpha"));
        let mut doc = Document::new(DocumentId::new("u1").unwrap(), fields);
        doc.created_at = Some("2026-01-01T00:00:00Z".into());

        assert_eq!(doc.to_value(), json!({"id": "u1", "title": "Alpha"}));
        assert_eq!(doc.get("title"), Some(&json!("Alpha")));
        assert!(!doc.has_field("createdAt"));
    }

    #[test]
    fn test_fields_from_value() {
        let fields = fields_from_value(json!({"a": 1, "b": [true]})).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields_from_value(json!([1, 2])).is_none());
    }
}
