//! Prices validated activity records in kg CO2e.

use carbonlex_core::{ActivityRecord, normalize};
use tracing::info;

use crate::error::CalcError;
use crate::factors::FactorTable;
use crate::result::{EmissionResult, RecordEmission};

/// Applies a [`FactorTable`] to activity records.
///
/// A run is all-or-nothing: the first record that cannot be priced aborts the
/// run and no partial result is returned.
#[derive(Debug, Clone)]
pub struct EmissionsCalculator<'a> {
    factors: &'a FactorTable,
    region: Option<String>,
}

impl<'a> EmissionsCalculator<'a> {
    pub fn new(factors: &'a FactorTable) -> Self {
        Self {
            factors,
            region: None,
        }
    }

    /// Prefer factors for `region` where the table has them.
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn calculate(&self, records: &[ActivityRecord]) -> Result<EmissionResult, CalcError> {
        let region = self.region.as_deref();
        let mut priced = Vec::with_capacity(records.len());

        for (index, rec) in records.iter().enumerate() {
            let canonical = normalize(rec.activity_type, rec.amount, rec.unit).map_err(|source| {
                CalcError::Conversion {
                    index,
                    row: rec.row,
                    source,
                }
            })?;
            let factor = self
                .factors
                .factor_for_category(rec.activity_type, &rec.category, canonical.unit, region)
                .map_err(|e| CalcError::UnknownEmissionFactor {
                    index,
                    row: rec.row,
                    activity_type: e.activity_type,
                    unit: e.unit,
                })?;

            let co2_kg = canonical.amount * factor.factor;
            if !canonical.amount.is_finite() || !co2_kg.is_finite() {
                return Err(CalcError::NonFiniteEmission {
                    index,
                    row: rec.row,
                });
            }

            priced.push(RecordEmission {
                row: rec.row,
                activity_type: rec.activity_type,
                category: rec.category.clone(),
                scope: rec.activity_type.ghg_scope(),
                amount: rec.amount,
                unit: rec.unit,
                canonical,
                factor: factor.factor,
                factor_source: factor.source.clone(),
                co2_kg,
                date: rec.date,
            });
        }

        let result = EmissionResult::from_records(priced, self.region.clone());
        // Per-record values are finite and non-negative, so every breakdown
        // sum is bounded by the total.
        if !result.total_co2_kg().is_finite() {
            return Err(CalcError::NonFiniteTotal);
        }
        info!(
            records = records.len(),
            total_kg = result.total_co2_kg(),
            region = region.unwrap_or("default"),
            "calculated emissions"
        );
        Ok(result)
    }
}
