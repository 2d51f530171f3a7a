//! Logical/physical name translation.
//!
//! Callers speak in hierarchical-document names (`bookCategories`,
//! `publishedAt`); the relational store speaks in snake_case table and column
//! names. Every conversion between the two goes through [`NameTranslator`].

mod translator;

pub use translator::{NameOverride, NameTranslator, OverrideError};
