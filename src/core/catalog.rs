//! Static alchemy reference data keyed by item name.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::debug;

const EMBEDDED_DATASET: &str = include_str!("../../data/items.json");

/// Alchemy constants for one item. Missing yields and limits read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: u32,
    #[serde(rename = "highalch", default)]
    pub high_alch: i64,
    #[serde(rename = "lowalch", default)]
    pub low_alch: i64,
    #[serde(rename = "buylimit", default)]
    pub buy_limit: i64,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    items: Vec<HashMap<String, ReferenceEntry>>,
}

/// Read-only lookup table loaded once and shared by reference.
#[derive(Debug, Default)]
pub struct ReferenceCatalog {
    by_name: HashMap<String, ReferenceEntry>,
    names_by_id: HashMap<u32, String>,
}

/// Formats a name the way the catalogue displays it: "abyssal WHIP" becomes "Abyssal whip".
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ReferenceCatalog {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_DATASET).context("Failed to parse embedded reference data")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference data: {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse reference data: {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(raw)?;
        let mut catalog = Self::default();
        for (name, entry) in dataset.items.into_iter().flatten() {
            catalog.insert(name, entry);
        }
        debug!("Loaded {} reference entries", catalog.len());
        Ok(catalog)
    }

    // First occurrence of a name wins.
    fn insert(&mut self, name: String, entry: ReferenceEntry) {
        if let Entry::Vacant(slot) = self.by_name.entry(name) {
            self.names_by_id
                .entry(entry.id)
                .or_insert_with(|| slot.key().clone());
            slot.insert(entry);
        }
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&ReferenceEntry> {
        self.by_name.get(&normalize_name(name))
    }

    /// Id of the named item, or 0 when the catalog has no such item.
    pub fn resolve_id(&self, name: &str) -> u32 {
        self.lookup_by_name(name).map_or(0, |entry| entry.id)
    }

    pub fn lookup_by_id(&self, id: u32) -> Option<(&str, &ReferenceEntry)> {
        let name = self.names_by_id.get(&id)?;
        self.by_name
            .get(name)
            .map(|entry| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
