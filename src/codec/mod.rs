//! Document codec.
//!
//! Converts between physical rows as the store returns them and logical
//! documents (`{id, ...fields}`) as callers see them, for both collection
//! encodings.

mod convert;
mod document;
mod error;

pub use convert::{merge_fields, DocumentCodec};
pub use document::{fields_from_value, Document, DocumentId, Fields, InvalidIdError};
pub use error::{CodecError, CodecResult};

/// Current time in the format written to the timestamp columns.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
