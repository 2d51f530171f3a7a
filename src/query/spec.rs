//! Abstract query types in the hierarchical-document vocabulary.
//!
//! Field names here are always logical. The compiler decides what they
//! address physically.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::error::{QueryError, QueryResult};

/// Predicate operators of the document query language.
///
/// Only the six comparisons compile; the membership operators exist so
/// callers ported from the document store fail loudly instead of silently
/// losing a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    ArrayContains,
    In,
    NotIn,
}

impl Operator {
    /// The document-store spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::ArrayContains => "array-contains",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        match s.trim() {
            "==" | "=" | "eq" => Ok(Operator::Eq),
            "!=" | "<>" | "neq" | "ne" => Ok(Operator::Neq),
            ">" | "gt" => Ok(Operator::Gt),
            ">=" | "gte" => Ok(Operator::Gte),
            "<" | "lt" => Ok(Operator::Lt),
            "<=" | "lte" => Ok(Operator::Lte),
            "array-contains" => Ok(Operator::ArrayContains),
            "in" => Ok(Operator::In),
            "not-in" => Ok(Operator::NotIn),
            other => Err(QueryError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `field op value` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a predicate from a textual operator (`"=="`, `"gte"`, ...).
    pub fn parse(field: impl Into<String>, op: &str, value: impl Into<Value>) -> QueryResult<Self> {
        Ok(Self::new(field, op.parse()?, value))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// ORDER BY on one logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// An abstract query against one collection.
///
/// No predicates means no filtering. No `order_by` means newest first by
/// creation time, so offset pagination is deterministic. Offset pagination
/// is not stable under concurrent inserts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    pub predicates: Vec<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QuerySpec {
    /// Match everything, default order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate.
    pub fn filter(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::new(field, op, value));
        self
    }

    /// Add an already built predicate.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Put `predicate` ahead of every caller predicate.
    pub(crate) fn prepend(mut self, predicate: Predicate) -> Self {
        self.predicates.insert(0, predicate);
        self
    }
}
