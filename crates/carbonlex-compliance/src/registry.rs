//! In-memory regulation registry.
//!
//! Loaded once at startup, in a fixed order, and read-only afterwards.
//! Entries without an official URL are kept but marked unverified so they can
//! be tracked without ever reaching a compliance report.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use carbonlex_core::{Region, Regulation, normalize_term};
use tracing::{info, warn};

use crate::error::RegistryError;

const BUILTIN_REGULATIONS: &str = include_str!("../data/regulations.json");

#[derive(Debug, Clone, Default)]
pub struct RegulationRegistry {
    regulations: Vec<Regulation>,
}

impl RegulationRegistry {
    /// Load entries in the given order.
    ///
    /// Scope terms are trimmed and lower-cased. An entry with an empty
    /// `official_url` is loaded with `verified = false`.
    pub fn load(entries: impl IntoIterator<Item = Regulation>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut regulations = Vec::new();

        for mut reg in entries {
            if !seen.insert(reg.id.clone()) {
                return Err(RegistryError::DuplicateId(reg.id));
            }
            reg.scope = reg
                .scope
                .iter()
                .map(|t| normalize_term(t))
                .filter(|t| !t.is_empty())
                .collect();
            reg.official_url = reg.official_url.trim().to_string();
            if reg.official_url.is_empty() && reg.verified {
                warn!(id = %reg.id, name = %reg.name, "no official url, loading as unverified");
                reg.verified = false;
            } else if reg.official_url.is_empty() {
                warn!(id = %reg.id, name = %reg.name, "no official url");
            }
            regulations.push(reg);
        }

        let registry = Self { regulations };
        info!(
            count = registry.len(),
            verified = registry.verified().len(),
            "loaded regulation registry"
        );
        Ok(registry)
    }

    /// The curated data set covering the EU, Asia-Pacific, and other regions.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json_str(BUILTIN_REGULATIONS)
    }

    /// Load a registry from a JSON array of regulations.
    pub fn from_json<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let entries: Vec<Regulation> = serde_json::from_reader(reader)?;
        Self::load(entries)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let entries: Vec<Regulation> = serde_json::from_str(json)?;
        Self::load(entries)
    }

    /// All entries in registry order.
    pub fn all(&self) -> &[Regulation] {
        &self.regulations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Regulation> {
        self.regulations.iter()
    }

    pub fn len(&self) -> usize {
        self.regulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regulations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Regulation> {
        self.regulations.iter().find(|r| r.id == id)
    }

    pub fn by_region(&self, region: Region) -> Vec<&Regulation> {
        self.regulations.iter().filter(|r| r.region == region).collect()
    }

    /// Entries whose scope contains `category` (exact term, case-insensitive).
    pub fn by_scope(&self, category: &str) -> Vec<&Regulation> {
        self.regulations.iter().filter(|r| r.covers(category)).collect()
    }

    pub fn by_country(&self, country: &str) -> Vec<&Regulation> {
        let wanted = normalize_term(country);
        self.regulations
            .iter()
            .filter(|r| normalize_term(&r.country) == wanted)
            .collect()
    }

    pub fn verified(&self) -> Vec<&Regulation> {
        self.regulations.iter().filter(|r| r.verified).collect()
    }

    /// Case-insensitive substring search over name, scope terms, and requirements.
    pub fn search(&self, keyword: &str) -> Vec<&Regulation> {
        let needle = normalize_term(keyword);
        if needle.is_empty() {
            return Vec::new();
        }
        self.regulations
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.requirements.to_lowercase().contains(&needle)
                    || r.scope.iter().any(|t| t.contains(&needle))
            })
            .collect()
    }

    /// Number of entries per region. Regions with no entries are absent.
    pub fn counts_by_region(&self) -> BTreeMap<Region, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.regulations {
            *counts.entry(r.region).or_insert(0) += 1;
        }
        counts
    }
}
