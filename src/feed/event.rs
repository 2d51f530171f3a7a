//! Decoded change events.

use std::fmt;

use crate::catalog::CollectionDescriptor;
use crate::codec::{CodecResult, Document, DocumentCodec};
use crate::store::{RowChange, RowChangeKind};

/// What happened to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl From<RowChangeKind> for ChangeKind {
    fn from(kind: RowChangeKind) -> Self {
        match kind {
            RowChangeKind::Insert => ChangeKind::Insert,
            RowChangeKind::Update => ChangeKind::Update,
            RowChangeKind::Delete => ChangeKind::Delete,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// A row change decoded into logical documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Logical collection the subscription was opened on.
    pub collection: String,
    pub kind: ChangeKind,
    /// Document after the change; `None` for deletes.
    pub new_document: Option<Document>,
    /// Document before the change, when the store reports it.
    pub old_document: Option<Document>,
}

impl ChangeEvent {
    pub(crate) fn decode(
        codec: &DocumentCodec<'_>,
        descriptor: &CollectionDescriptor,
        change: &RowChange,
    ) -> CodecResult<Self> {
        let new_document = change
            .new
            .as_ref()
            .map(|row| codec.decode(descriptor, row))
            .transpose()?;
        let old_document = change
            .old
            .as_ref()
            .map(|row| codec.decode(descriptor, row))
            .transpose()?;

        Ok(Self {
            collection: descriptor.logical_name.clone(),
            kind: change.kind.into(),
            new_document,
            old_document,
        })
    }

    /// The affected document: the new one, or the old one for deletes.
    pub fn document(&self) -> Option<&Document> {
        self.new_document.as_ref().or(self.old_document.as_ref())
    }
}
