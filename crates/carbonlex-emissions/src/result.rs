//! Calculation results handed to reporting, rendering, and storage.

use std::collections::BTreeMap;

use carbonlex_core::{ActivityType, GhgScope, Quantity, Unit};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Most recommendations returned by [`EmissionResult::recommendations`].
pub const MAX_RECOMMENDATIONS: usize = 8;

const ELECTRICITY_ADVICE: [&str; 4] = [
    "Switch to renewable energy sources or green electricity tariffs",
    "Implement energy-efficient LED lighting systems",
    "Install programmable thermostats and energy management systems",
    "Consider solar panels or other on-site renewable energy generation",
];

const FUEL_ADVICE: [&str; 4] = [
    "Transition to electric or hybrid vehicles",
    "Optimize delivery routes and consolidate trips",
    "Consider biofuels or other alternative fuel sources",
    "Implement fuel-efficient driving practices and training",
];

const TRANSPORT_ADVICE: [&str; 4] = [
    "Promote remote work and video conferencing",
    "Encourage public transportation or carpooling",
    "Consider electric vehicle fleet transition",
    "Implement travel policies to reduce business travel",
];

const HEATING_ADVICE: [&str; 4] = [
    "Upgrade to high-efficiency heating systems",
    "Improve building insulation and weatherproofing",
    "Consider heat pumps or other renewable heating sources",
    "Implement smart building controls and zoning",
];

const GENERAL_ADVICE: [&str; 4] = [
    "Conduct regular energy audits to identify improvement opportunities",
    "Set science-based emission reduction targets",
    "Engage employees in sustainability initiatives",
    "Consider carbon offset programs for remaining emissions",
];

/// Emissions attributed to one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEmission {
    /// Source row index from validation.
    pub row: usize,
    pub activity_type: ActivityType,
    pub category: String,
    pub scope: GhgScope,
    pub amount: f64,
    pub unit: Unit,
    /// The amount after normalisation to the canonical unit.
    pub canonical: Quantity,
    pub factor: f64,
    pub factor_source: String,
    pub co2_kg: f64,
    pub date: Option<NaiveDate>,
}

/// Emissions summed over one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEmission {
    pub year: i32,
    pub month: u32,
    pub co2_kg: f64,
}

impl MonthlyEmission {
    /// `YYYY-MM`.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// The outcome of one calculation run. Built only by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    records: Vec<RecordEmission>,
    total_co2_kg: f64,
    by_activity: BTreeMap<ActivityType, f64>,
    by_category: BTreeMap<String, f64>,
    by_scope: BTreeMap<GhgScope, f64>,
    monthly: Option<Vec<MonthlyEmission>>,
    date_range: Option<(NaiveDate, NaiveDate)>,
    region: Option<String>,
}

impl EmissionResult {
    pub(crate) fn from_records(records: Vec<RecordEmission>, region: Option<String>) -> Self {
        let mut total_co2_kg = 0.0;
        let mut by_activity = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut by_scope = BTreeMap::new();
        let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        let mut date_range: Option<(NaiveDate, NaiveDate)> = None;

        for r in &records {
            total_co2_kg += r.co2_kg;
            *by_activity.entry(r.activity_type).or_insert(0.0) += r.co2_kg;
            *by_category.entry(r.category.clone()).or_insert(0.0) += r.co2_kg;
            *by_scope.entry(r.scope).or_insert(0.0) += r.co2_kg;
            if let Some(d) = r.date {
                *by_month.entry((d.year(), d.month())).or_insert(0.0) += r.co2_kg;
                date_range = Some(match date_range {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        by_activity.retain(|_, v| *v != 0.0);
        by_category.retain(|_, v| *v != 0.0);
        by_scope.retain(|_, v| *v != 0.0);

        let monthly = date_range.map(|_| {
            by_month
                .into_iter()
                .filter(|(_, v)| *v != 0.0)
                .map(|((year, month), co2_kg)| MonthlyEmission {
                    year,
                    month,
                    co2_kg,
                })
                .collect()
        });

        Self {
            records,
            total_co2_kg,
            by_activity,
            by_category,
            by_scope,
            monthly,
            date_range,
            region,
        }
    }

    pub fn records(&self) -> &[RecordEmission] {
        &self.records
    }

    pub fn total_co2_kg(&self) -> f64 {
        self.total_co2_kg
    }

    pub fn total_tonnes(&self) -> f64 {
        self.total_co2_kg / 1000.0
    }

    pub fn by_activity(&self) -> &BTreeMap<ActivityType, f64> {
        &self.by_activity
    }

    pub fn by_category(&self) -> &BTreeMap<String, f64> {
        &self.by_category
    }

    pub fn by_scope(&self) -> &BTreeMap<GhgScope, f64> {
        &self.by_scope
    }

    /// Ascending by month; present only when some record carried a date.
    /// Months without data are absent, so the series may have gaps.
    pub fn monthly(&self) -> Option<&[MonthlyEmission]> {
        self.monthly.as_deref()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    /// The factor region the run was priced for, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Reduction advice targeted at the largest source, then general advice.
    /// Empty when nothing was emitted.
    pub fn recommendations(&self) -> Vec<&'static str> {
        let Some((top, _)) = self.top_activities().first().copied() else {
            return Vec::new();
        };
        let targeted: &[&str] = match top {
            ActivityType::Electricity => &ELECTRICITY_ADVICE,
            ActivityType::Fuel => &FUEL_ADVICE,
            ActivityType::Transport => &TRANSPORT_ADVICE,
            ActivityType::Heating => &HEATING_ADVICE,
            _ => &[],
        };
        targeted
            .iter()
            .chain(GENERAL_ADVICE.iter())
            .copied()
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }

    /// Activities ordered by descending emissions.
    pub fn top_activities(&self) -> Vec<(ActivityType, f64)> {
        let mut out: Vec<(ActivityType, f64)> =
            self.by_activity.iter().map(|(k, v)| (*k, *v)).collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emission(activity_type: ActivityType, co2_kg: f64) -> RecordEmission {
        let unit = Unit::Kwh;
        RecordEmission {
            row: 0,
            activity_type,
            category: String::new(),
            scope: activity_type.ghg_scope(),
            amount: co2_kg,
            unit,
            canonical: Quantity { amount: co2_kg, unit },
            factor: 1.0,
            factor_source: "test".into(),
            co2_kg,
            date: None,
        }
    }

    #[test]
    fn recommendations_target_largest_source() {
        let result = EmissionResult::from_records(
            vec![
                emission(ActivityType::Electricity, 10.0),
                emission(ActivityType::Fuel, 50.0),
            ],
            None,
        );
        let recs = result.recommendations();
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0], FUEL_ADVICE[0]);
        assert_eq!(recs[4], GENERAL_ADVICE[0]);
    }

    #[test]
    fn untargeted_source_gets_general_advice() {
        let result = EmissionResult::from_records(vec![emission(ActivityType::Waste, 5.0)], None);
        assert_eq!(result.recommendations(), GENERAL_ADVICE.to_vec());
    }

    #[test]
    fn nothing_emitted_means_no_recommendations() {
        let result = EmissionResult::from_records(Vec::new(), None);
        assert!(result.recommendations().is_empty());
        let zero = EmissionResult::from_records(vec![emission(ActivityType::Heating, 0.0)], None);
        assert!(zero.recommendations().is_empty());
    }
}
