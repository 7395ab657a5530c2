//! Emission factor table: kg CO2e per canonical unit, keyed by activity.
//!
//! A factor key is `(activity_type, unit, category?, region?)`. The entry with
//! neither category nor region is the default for its `(activity_type, unit)`
//! pair; category and region entries refine it. Lookups try at most four
//! keys, most specific first:
//!
//! 1. category + region
//! 2. category
//! 3. region
//! 4. default
//!
//! Tables are built once through [`FactorTableBuilder`] and never change.

use std::collections::HashMap;
use std::io::Read;

use carbonlex_core::{ActivityType, Unit, normalize_category};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FactorError, UnknownEmissionFactor};

const BUILTIN_FACTORS: &str = include_str!("../data/emission_factors.json");

/// One emission factor with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub activity_type: ActivityType,
    /// Canonical unit the factor is expressed per.
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_region: Option<String>,
    /// kg CO2e per `unit`.
    pub factor: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactorKey {
    activity_type: ActivityType,
    unit: Unit,
    category: Option<String>,
    region: Option<String>,
}

impl FactorKey {
    fn new(
        activity_type: ActivityType,
        unit: Unit,
        category: Option<&str>,
        region: Option<&str>,
    ) -> Self {
        Self {
            activity_type,
            unit,
            category: category.map(normalize_category).filter(|c| !c.is_empty()),
            region: region.map(normalize_region).filter(|r| !r.is_empty()),
        }
    }
}

fn normalize_region(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Immutable lookup table of emission factors.
#[derive(Debug, Clone)]
pub struct FactorTable {
    factors: HashMap<FactorKey, EmissionFactor>,
}

impl FactorTable {
    /// The built-in data set (UK Government GHG Conversion Factors 2023 and
    /// related published sources).
    pub fn builtin() -> Result<Self, FactorError> {
        Self::from_json_str(BUILTIN_FACTORS)
    }

    /// Load a table from a JSON array of [`EmissionFactor`] entries.
    pub fn from_json<R: Read>(reader: R) -> Result<Self, FactorError> {
        let entries: Vec<EmissionFactor> = serde_json::from_reader(reader)?;
        Self::from_entries(entries)
    }

    pub fn from_json_str(json: &str) -> Result<Self, FactorError> {
        let entries: Vec<EmissionFactor> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = EmissionFactor>,
    ) -> Result<Self, FactorError> {
        let mut builder = FactorTableBuilder::new();
        for entry in entries {
            builder.add(entry)?;
        }
        let table = builder.build();
        info!(count = table.len(), "loaded emission factors");
        Ok(table)
    }

    /// Factor for `(activity_type, unit)`, preferring a `region`-specific entry.
    pub fn factor_for(
        &self,
        activity_type: ActivityType,
        unit: Unit,
        region: Option<&str>,
    ) -> Result<&EmissionFactor, UnknownEmissionFactor> {
        self.factor_for_category(activity_type, "", unit, region)
    }

    /// Factor for a record, refining by category and region where entries exist.
    pub fn factor_for_category(
        &self,
        activity_type: ActivityType,
        category: &str,
        unit: Unit,
        region: Option<&str>,
    ) -> Result<&EmissionFactor, UnknownEmissionFactor> {
        let category = Some(category);
        let candidates = [
            (category, region),
            (category, None),
            (None, region),
            (None, None),
        ];
        for (cat, reg) in candidates {
            let key = FactorKey::new(activity_type, unit, cat, reg);
            if let Some(f) = self.factors.get(&key) {
                debug!(
                    activity = %activity_type,
                    unit = %unit,
                    category = ?key.category,
                    region = ?key.region,
                    factor = f.factor,
                    "factor lookup"
                );
                return Ok(f);
            }
        }
        Err(UnknownEmissionFactor {
            activity_type,
            unit,
        })
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// All entries, ordered by activity, unit, category, then region.
    pub fn entries(&self) -> Vec<&EmissionFactor> {
        let mut out: Vec<(&FactorKey, &EmissionFactor)> = self.factors.iter().collect();
        out.sort_by(|(a, _), (b, _)| {
            (a.activity_type, a.unit, &a.category, &a.region).cmp(&(
                b.activity_type,
                b.unit,
                &b.category,
                &b.region,
            ))
        });
        out.into_iter().map(|(_, f)| f).collect()
    }
}

/// Append-only builder for a [`FactorTable`].
#[derive(Debug, Default)]
pub struct FactorTableBuilder {
    factors: HashMap<FactorKey, EmissionFactor>,
}

impl FactorTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one factor. Rejects duplicate keys, non-canonical units, and
    /// negative or non-finite values.
    pub fn add(&mut self, mut factor: EmissionFactor) -> Result<&mut Self, FactorError> {
        let activity_type = factor.activity_type;
        let unit = factor.unit;
        let invalid = |reason: &str| FactorError::InvalidFactor {
            activity_type,
            unit,
            reason: reason.to_string(),
        };

        if !factor.factor.is_finite() || factor.factor < 0.0 {
            return Err(invalid("factor must be a finite number >= 0"));
        }
        let family = activity_type.unit_family();
        if !family.contains(unit) {
            return Err(invalid("unit is outside the activity's unit family"));
        }
        if family.base_unit().is_some_and(|base| base != unit) {
            return Err(invalid("unit is not the canonical unit"));
        }

        let key = FactorKey::new(
            activity_type,
            unit,
            factor.category.as_deref(),
            factor.valid_region.as_deref(),
        );
        if self.factors.contains_key(&key) {
            return Err(FactorError::DuplicateFactor {
                activity_type,
                unit,
                category: key.category,
                region: key.region,
            });
        }
        factor.category = key.category.clone();
        factor.valid_region = key.region.clone();
        self.factors.insert(key, factor);
        Ok(self)
    }

    pub fn build(self) -> FactorTable {
        FactorTable {
            factors: self.factors,
        }
    }
}
