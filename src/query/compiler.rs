//! Query compiler: abstract query spec -> native store query.
//!
//! The physical target of a logical field depends on the collection's
//! encoding:
//!
//! ```text
//! field            FlatColumns              SingleJsonColumn
//! ---------------  -----------------------  ------------------------
//! id               id                       id
//! createdAt        created_at               created_at
//! parent field     category_id              category_id
//! anything else    translated column        data->>field (verbatim)
//! ```
//!
//! JSON text extraction yields `"true"`/`"false"` for booleans, so boolean
//! operands against a JSON path are compared as their text form.

use serde_json::Value;

use super::error::{QueryError, QueryResult};
use super::spec::{Direction, Operator, Predicate, QuerySpec};
use crate::catalog::{CollectionDescriptor, Encoding, PhysicalLayout};
use crate::naming::NameTranslator;
use crate::store::{Comparison, FieldRef, NativeFilter, NativeQuery, NativeSort, Range};

/// Compiles queries for one catalog's layout and naming rules.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    layout: &'a PhysicalLayout,
    translator: &'a NameTranslator,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(layout: &'a PhysicalLayout, translator: &'a NameTranslator) -> Self {
        Self { layout, translator }
    }

    /// Compile a full query: filters, order and range.
    pub fn compile(
        &self,
        collection: &CollectionDescriptor,
        spec: &QuerySpec,
    ) -> QueryResult<NativeQuery> {
        let filters = self.compile_filters(collection, &spec.predicates)?;

        let sort = match &spec.order_by {
            Some(order) => {
                if order.field.is_empty() {
                    return Err(QueryError::EmptyField);
                }
                NativeSort {
                    target: self.field_ref(collection, &order.field),
                    ascending: order.direction == Direction::Asc,
                }
            }
            None => NativeSort {
                target: FieldRef::column(self.layout.created_column.clone()),
                ascending: false,
            },
        };

        let range = match (spec.limit, spec.offset) {
            (None, None) => None,
            (limit, offset) => Some(Range {
                offset: offset.unwrap_or(0),
                limit,
            }),
        };

        Ok(NativeQuery {
            filters,
            sort: vec![sort],
            range,
        })
    }

    /// Compile a predicate list on its own (used by count).
    pub fn compile_filters(
        &self,
        collection: &CollectionDescriptor,
        predicates: &[Predicate],
    ) -> QueryResult<Vec<NativeFilter>> {
        predicates
            .iter()
            .map(|p| self.compile_predicate(collection, p))
            .collect()
    }

    fn compile_predicate(
        &self,
        collection: &CollectionDescriptor,
        predicate: &Predicate,
    ) -> QueryResult<NativeFilter> {
        if predicate.field.is_empty() {
            return Err(QueryError::EmptyField);
        }

        let comparison = comparison_for(predicate.op)?;
        let target = self.field_ref(collection, &predicate.field);

        let value = match (&target, &predicate.value) {
            (FieldRef::JsonText { .. }, Value::Bool(b)) => Value::String(b.to_string()),
            (_, value) => value.clone(),
        };

        Ok(NativeFilter::new(target, comparison, value))
    }

    /// Resolve what a logical field addresses in `collection`'s table.
    pub fn field_ref(&self, collection: &CollectionDescriptor, field: &str) -> FieldRef {
        let column = self.translator.to_physical(field);
        if column == self.layout.id_column
            || column == self.layout.created_column
            || column == self.layout.updated_column
            || collection.is_promoted(field)
        {
            return FieldRef::Column(column);
        }

        match collection.encoding {
            Encoding::FlatColumns => FieldRef::Column(column),
            Encoding::SingleJsonColumn => {
                FieldRef::json_text(self.layout.blob_column.clone(), field)
            }
        }
    }
}

fn comparison_for(op: Operator) -> QueryResult<Comparison> {
    match op {
        Operator::Eq => Ok(Comparison::Eq),
        Operator::Neq => Ok(Comparison::Neq),
        Operator::Gt => Ok(Comparison::Gt),
        Operator::Gte => Ok(Comparison::Gte),
        Operator::Lt => Ok(Comparison::Lt),
        Operator::Lte => Ok(Comparison::Lte),
        Operator::ArrayContains | Operator::In | Operator::NotIn => {
            Err(QueryError::UnsupportedOperator(op.symbol().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NameOverride;
    use crate::query::OrderBy;
    use serde_json::json;

    fn translator() -> NameTranslator {
        NameTranslator::with_overrides([NameOverride::new("imgUrl", "image_url")]).unwrap()
    }

    fn flat() -> CollectionDescriptor {
        CollectionDescriptor::new("books", "books", Encoding::FlatColumns)
    }

    fn json_items() -> CollectionDescriptor {
        CollectionDescriptor::new("categories/items", "items", Encoding::SingleJsonColumn)
            .with_parent_field("categoryId")
    }

    #[test]
    fn test_flat_columns_translate_fields() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);

        let spec = QuerySpec::new()
            .filter("authorName", Operator::Eq, "Rumi")
            .filter("imgUrl", Operator::Neq, Value::Null)
            .filter("published", Operator::Eq, true)
            .order_by(OrderBy::asc("publishedAt"));

        let query = compiler.compile(&flat(), &spec).unwrap();
        assert_eq!(
            query.filters,
            vec![
                NativeFilter::new(FieldRef::column("author_name"), Comparison::Eq, json!("Rumi")),
                NativeFilter::new(FieldRef::column("image_url"), Comparison::Neq, Value::Null),
                // flat booleans are compared as booleans
                NativeFilter::new(FieldRef::column("published"), Comparison::Eq, json!(true)),
            ]
        );
        assert_eq!(
            query.sort,
            vec![NativeSort {
                target: FieldRef::column("published_at"),
                ascending: true
            }]
        );
        assert_eq!(query.range, None);
    }

    #[test]
    fn test_json_column_uses_logical_paths() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);

        let spec = QuerySpec::new()
            .filter("isFeatured", Operator::Eq, true)
            .filter("rank", Operator::Gte, 3)
            .order_by(OrderBy::desc("sortOrder"));

        let query = compiler.compile(&json_items(), &spec).unwrap();
        assert_eq!(
            query.filters,
            vec![
                NativeFilter::new(
                    FieldRef::json_text("data", "isFeatured"),
                    Comparison::Eq,
                    json!("true")
                ),
                NativeFilter::new(FieldRef::json_text("data", "rank"), Comparison::Gte, json!(3)),
            ]
        );
        assert_eq!(query.sort[0].target, FieldRef::json_text("data", "sortOrder"));
        assert!(!query.sort[0].ascending);
    }

    #[test]
    fn test_columns_outside_blob() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);
        let items = json_items();

        assert_eq!(compiler.field_ref(&items, "id"), FieldRef::column("id"));
        assert_eq!(compiler.field_ref(&items, "createdAt"), FieldRef::column("created_at"));
        assert_eq!(compiler.field_ref(&items, "updatedAt"), FieldRef::column("updated_at"));
        assert_eq!(compiler.field_ref(&items, "categoryId"), FieldRef::column("category_id"));

        let filters = compiler
            .compile_filters(&items, &[Predicate::new("categoryId", Operator::Eq, "c1")])
            .unwrap();
        assert_eq!(filters[0], NativeFilter::column_eq("category_id", "c1"));
    }

    #[test]
    fn test_default_order_and_range() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);

        for descriptor in [flat(), json_items()] {
            let query = compiler
                .compile(&descriptor, &QuerySpec::new().limit(10).offset(10))
                .unwrap();
            assert!(query.filters.is_empty());
            assert_eq!(
                query.sort,
                vec![NativeSort {
                    target: FieldRef::column("created_at"),
                    ascending: false
                }]
            );
            assert_eq!(
                query.range,
                Some(Range {
                    offset: 10,
                    limit: Some(10)
                })
            );
        }

        let query = compiler.compile(&flat(), &QuerySpec::new().offset(5)).unwrap();
        assert_eq!(query.range, Some(Range { offset: 5, limit: None }));
    }

    #[test]
    fn test_unsupported_operator_fails_loudly() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);

        for op in [Operator::ArrayContains, Operator::In, Operator::NotIn] {
            let spec = QuerySpec::new().filter("tags", op, json!(["a"]));
            let err = compiler.compile(&flat(), &spec).unwrap_err();
            assert!(matches!(err, QueryError::UnsupportedOperator(_)));
        }
    }

    #[test]
    fn test_empty_field_rejected() {
        let layout = PhysicalLayout::default();
        let translator = translator();
        let compiler = QueryCompiler::new(&layout, &translator);

        let spec = QuerySpec::new().filter("", Operator::Eq, 1);
        assert_eq!(compiler.compile(&flat(), &spec), Err(QueryError::EmptyField));
    }
}
