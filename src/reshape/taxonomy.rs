//! Raw production-group labels → canonical fuel categories.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Production-group table as published by the declaration datasets.
const DEFAULT_TABLE: [(&str, &str); 17] = [
    ("Offshore", "Vind"),
    ("Onshore", "Vind"),
    ("Solceller", "Sol"),
    ("Sol", "Sol"),
    ("Anden VE", "Vandkraft"),
    ("Vandkraft", "Vandkraft"),
    ("Biogas", "Biomasse"),
    ("Træ_mm", "Biomasse"),
    ("Halm", "Biomasse"),
    ("Affald", "Affald"),
    ("Naturgas", "Naturgas"),
    ("Brunkul", "Kul og Olie"),
    ("Kul", "Kul og Olie"),
    ("Fuelolie", "Kul og Olie"),
    ("Gasolie", "Kul og Olie"),
    ("Olie", "Kul og Olie"),
    ("Atomkraft", "Atomkraft"),
];

/// Mapping table from raw labels to canonical categories.
///
/// The canonical category set is exactly the set of values in the table, so
/// [`Taxonomy::normalize`] can never produce anything outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    table: BTreeMap<String, String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        DEFAULT_TABLE
            .iter()
            .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for Taxonomy {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Taxonomy {
            table: iter.into_iter().collect(),
        }
    }
}

impl Taxonomy {
    /// Canonical category for `raw`.
    ///
    /// An unmapped label means the source schema moved; the run must stop rather
    /// than publish a silently incomplete mix.
    pub fn normalize(&self, raw: &str) -> Result<&str, PipelineError> {
        self.table
            .get(raw)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::UnknownCategory { label: raw.to_string() })
    }

    /// Canonical categories, sorted and de-duplicated.
    pub fn categories(&self) -> Vec<&str> {
        self.table
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Raw labels that collapse onto `category`.
    pub fn raw_labels(&self, category: &str) -> Vec<&str> {
        self.table
            .iter()
            .filter(|(_, c)| c.as_str() == category)
            .map(|(raw, _)| raw.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
