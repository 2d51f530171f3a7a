//! Bidirectional name mapping with an explicit override table.

use std::collections::BTreeMap;
use std::fmt;

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::{Deserialize, Serialize};

/// A paired logical/physical name override.
///
/// Overrides exist for names the case rule gets wrong: irregular plurals
/// (`favs` -> `favorites`), abbreviations, legacy columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOverride {
    pub logical: String,
    pub physical: String,
}

impl NameOverride {
    pub fn new(logical: impl Into<String>, physical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            physical: physical.into(),
        }
    }
}

/// Rejected override registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    #[error("override name cannot be empty")]
    Empty,

    #[error("logical name '{logical}' is already mapped to '{existing}'")]
    LogicalConflict { logical: String, existing: String },

    #[error("physical name '{physical}' is already mapped from '{existing}'")]
    PhysicalConflict { physical: String, existing: String },
}

/// Translates between logical (camelCase) and physical (snake_case) names.
///
/// Lookup order in both directions: the override table first, then the case
/// rule. Overrides are stored as pairs so the two directions stay inverse.
///
/// For logical names in canonical lowerCamelCase,
/// `to_logical(to_physical(n)) == n`. The case rule is not injective on
/// other shapes (`imageURL`, `image_url` and `imageUrl` all map to
/// `image_url`), and a logical name that equals the physical side of an
/// override is shadowed by it. [`NameTranslator::is_reversible`] tells the
/// two apart: distinct reversible names never share a physical name.
#[derive(Debug, Clone, Default)]
pub struct NameTranslator {
    to_physical: BTreeMap<String, String>,
    to_logical: BTreeMap<String, String>,
}

impl NameTranslator {
    /// A translator with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a translator from a list of overrides.
    pub fn with_overrides<I>(overrides: I) -> Result<Self, OverrideError>
    where
        I: IntoIterator<Item = NameOverride>,
    {
        let mut translator = Self::new();
        for entry in overrides {
            translator.add_override(entry)?;
        }
        Ok(translator)
    }

    /// Register a paired override.
    ///
    /// Re-registering the identical pair is a no-op; mapping either side to a
    /// different partner is rejected.
    pub fn add_override(&mut self, entry: NameOverride) -> Result<(), OverrideError> {
        if entry.logical.is_empty() || entry.physical.is_empty() {
            return Err(OverrideError::Empty);
        }

        if let Some(existing) = self.to_physical.get(&entry.logical) {
            if existing == &entry.physical {
                return Ok(());
            }
            return Err(OverrideError::LogicalConflict {
                logical: entry.logical,
                existing: existing.clone(),
            });
        }

        if let Some(existing) = self.to_logical.get(&entry.physical) {
            return Err(OverrideError::PhysicalConflict {
                physical: entry.physical,
                existing: existing.clone(),
            });
        }

        self.to_physical
            .insert(entry.logical.clone(), entry.physical.clone());
        self.to_logical.insert(entry.physical, entry.logical);
        Ok(())
    }

    /// Logical name -> physical table/column name.
    pub fn to_physical(&self, logical: &str) -> String {
        match self.to_physical.get(logical) {
            Some(physical) => physical.clone(),
            None => logical.to_snake_case(),
        }
    }

    /// Physical table/column name -> logical name.
    pub fn to_logical(&self, physical: &str) -> String {
        match self.to_logical.get(physical) {
            Some(logical) => logical.clone(),
            None => physical.to_lower_camel_case(),
        }
    }

    /// Whether `logical` survives a forward-then-back translation unchanged.
    pub fn is_reversible(&self, logical: &str) -> bool {
        self.to_logical(&self.to_physical(logical)) == logical
    }

    /// The registered overrides, ordered by logical name.
    pub fn overrides(&self) -> impl Iterator<Item = NameOverride> + '_ {
        self.to_physical
            .iter()
            .map(|(logical, physical)| NameOverride::new(logical.clone(), physical.clone()))
    }
}

impl fmt::Display for NameOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.logical, self.physical)
    }
}
