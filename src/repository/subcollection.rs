//! Subcollection emulation.
//!
//! `categories/{c1}/items` lives in a flat `items` table whose rows carry the
//! parent id in a dedicated column. Every subcollection call is rewritten to
//! a call on that table with the parent predicate put first, so caller
//! predicates can narrow the result but never escape the parent.

use serde_json::Value;

use super::error::{DataError, DataResult};
use super::repository::DocumentRepository;
use crate::catalog::CollectionDescriptor;
use crate::codec::{Document, Fields};
use crate::query::{Operator, Predicate, QuerySpec};

/// A resolved subcollection: its table descriptor and parent field.
struct Scope {
    descriptor: CollectionDescriptor,
    parent_field: String,
}

impl Scope {
    fn parent_predicate(&self, parent_id: &str) -> Predicate {
        Predicate::new(self.parent_field.clone(), Operator::Eq, parent_id)
    }

    fn owns(&self, document: &Document, parent_id: &str) -> bool {
        document.get(&self.parent_field).and_then(Value::as_str) == Some(parent_id)
    }
}

impl DocumentRepository {
    fn scope(&self, parent: &str, name: &str) -> DataResult<Scope> {
        let relation = self.catalog().subcollection(parent, name).ok_or_else(|| {
            DataError::UnregisteredSubcollection {
                parent: parent.to_string(),
                name: name.to_string(),
            }
        })?;

        Ok(Scope {
            descriptor: relation.descriptor.clone(),
            parent_field: relation.parent_field().to_string(),
        })
    }

    /// List documents of `parent/{parent_id}/name`.
    pub async fn list_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        spec: &QuerySpec,
    ) -> DataResult<Vec<Document>> {
        let scope = self.scope(parent, name)?;
        let spec = spec.clone().prepend(scope.parent_predicate(parent_id));
        self.list_in(&scope.descriptor, &spec).await
    }

    /// Insert into `parent/{parent_id}/name`. The parent field is always
    /// set to `parent_id`.
    pub async fn insert_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        mut fields: Fields,
    ) -> DataResult<Document> {
        let scope = self.scope(parent, name)?;
        fields.insert(scope.parent_field.clone(), Value::String(parent_id.to_string()));
        self.insert_in(&scope.descriptor, fields).await
    }

    /// Fetch one document. A document stored under another parent is
    /// reported as not found.
    pub async fn get_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        id: &str,
    ) -> DataResult<Document> {
        let scope = self.scope(parent, name)?;
        self.get_scoped(&scope, parent_id, id).await
    }

    async fn get_scoped(&self, scope: &Scope, parent_id: &str, id: &str) -> DataResult<Document> {
        let document = self.get_in(&scope.descriptor, id).await?;
        if !scope.owns(&document, parent_id) {
            return Err(DataError::NotFound {
                collection: scope.descriptor.logical_name.clone(),
                id: id.to_string(),
            });
        }
        Ok(document)
    }

    /// Merge `partial` into a document of this parent. The document cannot
    /// be moved to another parent.
    pub async fn update_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        id: &str,
        partial: &Fields,
    ) -> DataResult<Document> {
        let scope = self.scope(parent, name)?;
        self.get_scoped(&scope, parent_id, id).await?;

        let mut partial = partial.clone();
        partial.insert(scope.parent_field.clone(), Value::String(parent_id.to_string()));
        self.update_in(&scope.descriptor, id, &partial).await
    }

    /// Delete a document of this parent. Missing documents, or documents of
    /// another parent, are left alone.
    pub async fn delete_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        id: &str,
    ) -> DataResult<()> {
        let scope = self.scope(parent, name)?;
        match self.get_scoped(&scope, parent_id, id).await {
            Ok(_) => self.delete_in(&scope.descriptor, id).await,
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn count_sub(
        &self,
        parent: &str,
        parent_id: &str,
        name: &str,
        predicates: &[Predicate],
    ) -> DataResult<u64> {
        let scope = self.scope(parent, name)?;
        let mut all = Vec::with_capacity(predicates.len() + 1);
        all.push(scope.parent_predicate(parent_id));
        all.extend_from_slice(predicates);
        self.count_in(&scope.descriptor, &all).await
    }
}
