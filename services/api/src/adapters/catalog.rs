//! services/api/src/adapters/catalog.rs
//!
//! A static ad catalog implementing the `AdSelector` port. Entries are read
//! once at startup from a JSON array; selection takes the first entry whose
//! category is among the intents and whose size, if pinned, fits the slot.

use ad_replacement_core::domain::{AdCandidate, Intents};
use ad_replacement_core::ports::{AdSelector, PortError, PortResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub ad: AdCandidate,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl CatalogEntry {
    fn fits(&self, width: f64, height: f64) -> bool {
        self.width.map_or(true, |w| w == width) && self.height.map_or(true, |h| h == height)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogAdSelector {
    entries: Vec<CatalogEntry>,
}

impl CatalogAdSelector {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(raw: &str) -> PortResult<Self> {
        let entries = serde_json::from_str::<Vec<CatalogEntry>>(raw)
            .map_err(|e| PortError::Unexpected(format!("Invalid ad catalog: {}", e)))?;
        Ok(Self::new(entries))
    }

    pub fn from_path(path: &Path) -> PortResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PortError::Unexpected(format!("Failed to read ad catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AdSelector for CatalogAdSelector {
    fn ad_unit_for_intents(
        &self,
        intents: &Intents,
        width: f64,
        height: f64,
    ) -> Option<AdCandidate> {
        self.entries
            .iter()
            .find(|entry| intents.contains(&entry.ad.category) && entry.fits(width, height))
            .map(|entry| entry.ad.clone())
    }
}
