//! Query building and compilation.
//!
//! Callers describe what they want with a [`QuerySpec`] in logical names;
//! [`QueryCompiler`] turns it into a [`NativeQuery`](crate::store::NativeQuery)
//! for the collection's physical encoding.

mod compiler;
mod error;
mod spec;

pub use compiler::QueryCompiler;
pub use error::{QueryError, QueryResult};
pub use spec::{Direction, Operator, OrderBy, Predicate, QuerySpec};
