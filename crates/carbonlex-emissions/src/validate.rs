//! Upload validation: raw rows in, typed [`ActivityRecord`]s and row errors out.
//!
//! Each row is checked in a fixed order and rejected at the first failure.
//! A row is either accepted whole or rejected whole.

use std::collections::{BTreeMap, BTreeSet};

use carbonlex_core::{ActivityRecord, ActivityType, Unit};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ValidationError;

/// One uploaded row: column name → raw cell text.
pub type RawRow = BTreeMap<String, String>;

pub const REQUIRED_COLUMNS: [&str; 4] = ["activity_type", "category", "amount", "unit"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// A rejected row and the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 0-based index into the uploaded rows.
    pub row: usize,
    pub error: ValidationError,
}

/// Outcome of validating an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub records: Vec<ActivityRecord>,
    pub errors: Vec<RowError>,
    pub total_rows: usize,
}

/// Overview of the accepted rows of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub activity_types: Vec<ActivityType>,
    pub categories: Vec<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> ValidationSummary {
        let activity_types: BTreeSet<ActivityType> =
            self.records.iter().map(|r| r.activity_type).collect();
        let categories: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        let mut dates = self.records.iter().filter_map(|r| r.date);
        let date_range = dates.next().map(|first| {
            dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)))
        });

        ValidationSummary {
            total_rows: self.total_rows,
            accepted: self.records.len(),
            rejected: self.errors.len(),
            activity_types: activity_types.into_iter().collect(),
            categories: categories.into_iter().map(String::from).collect(),
            date_range,
        }
    }
}

/// Validate every row of an upload.
pub fn validate_rows(rows: &[RawRow]) -> ValidationReport {
    let mut records = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(index, row) {
            Ok(record) => records.push(record),
            Err(error) => errors.push(RowError { row: index, error }),
        }
    }

    info!(
        total = rows.len(),
        accepted = records.len(),
        rejected = errors.len(),
        "validated upload"
    );

    ValidationReport {
        records,
        errors,
        total_rows: rows.len(),
    }
}

/// Validate a single row. `index` becomes the record's row number.
pub fn validate_row(index: usize, row: &RawRow) -> Result<ActivityRecord, ValidationError> {
    let mut values = [""; REQUIRED_COLUMNS.len()];
    for (slot, col) in values.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = field(row, col).ok_or_else(|| ValidationError::MissingColumn(col.to_string()))?;
    }
    let [raw_type, raw_category, raw_amount, raw_unit] = values;

    let activity_type = ActivityType::parse(raw_type)
        .ok_or_else(|| ValidationError::UnknownActivityType(raw_type.to_string()))?;

    let amount = parse_amount(raw_amount)?;
    if amount == 0.0 {
        warn!(row = index, activity = %activity_type, "zero amount");
    }

    let unit = Unit::parse(raw_unit)
        .filter(|u| activity_type.accepts(*u))
        .ok_or_else(|| ValidationError::IncompatibleUnit {
            unit: raw_unit.to_string(),
            activity_type,
        })?;

    let mut record = ActivityRecord::new(activity_type, raw_category, amount, unit).at_row(index);
    if let Some(raw_date) = field(row, "date") {
        record = record.with_date(parse_date(raw_date)?);
    }
    Ok(record)
}

/// Parse an upload date in any accepted form.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| ValidationError::InvalidDate(s.to_string()))
}

fn parse_amount(s: &str) -> Result<f64, ValidationError> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ValidationError::InvalidAmount(s.to_string())),
    }
}

/// Look up a column by trimmed, case-insensitive name. Blank cells count as absent.
fn field<'a>(row: &'a RawRow, name: &str) -> Option<&'a str> {
    row.iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn electricity() -> RawRow {
        row(&[
            ("activity_type", "electricity"),
            ("category", "Grid"),
            ("amount", "1000"),
            ("unit", "kWh"),
        ])
    }

    #[test]
    fn accepts_well_formed_row() {
        let rec = validate_row(3, &electricity()).unwrap();
        assert_eq!(rec.row, 3);
        assert_eq!(rec.activity_type, ActivityType::Electricity);
        assert_eq!(rec.category, "grid");
        assert_eq!(rec.amount, 1000.0);
        assert_eq!(rec.unit, Unit::Kwh);
        assert_eq!(rec.date, None);
    }

    #[test]
    fn column_names_are_case_insensitive() {
        let r = row(&[
            (" Activity_Type ", "fuel"),
            ("CATEGORY", "diesel"),
            ("Amount", "12.5"),
            ("Unit", "L"),
        ]);
        assert!(validate_row(0, &r).is_ok());
    }

    #[test]
    fn missing_column_is_reported_first() {
        let mut r = electricity();
        r.remove("unit");
        r.insert("activity_type".into(), "teleportation".into());
        assert_eq!(
            validate_row(0, &r),
            Err(ValidationError::MissingColumn("unit".into()))
        );
    }

    #[test]
    fn blank_cell_counts_as_missing() {
        let mut r = electricity();
        r.insert("category".into(), "   ".into());
        assert_eq!(
            validate_row(0, &r),
            Err(ValidationError::MissingColumn("category".into()))
        );
    }

    #[test]
    fn unknown_activity_type() {
        let mut r = electricity();
        r.insert("activity_type".into(), "teleportation".into());
        assert_eq!(
            validate_row(0, &r),
            Err(ValidationError::UnknownActivityType("teleportation".into()))
        );
    }

    #[test]
    fn invalid_amounts() {
        for bad in ["-1", "abc", "NaN", "inf", "1,000"] {
            let mut r = electricity();
            r.insert("amount".into(), bad.into());
            assert_eq!(
                validate_row(0, &r),
                Err(ValidationError::InvalidAmount(bad.into())),
                "amount {bad:?}"
            );
        }
    }

    #[test]
    fn zero_amount_is_valid() {
        let mut r = electricity();
        r.insert("amount".into(), "0".into());
        assert_eq!(validate_row(0, &r).unwrap().amount, 0.0);
    }

    #[test]
    fn unit_outside_family_is_incompatible() {
        let r = row(&[
            ("activity_type", "transport"),
            ("category", "car_petrol"),
            ("amount", "10"),
            ("unit", "furlongs"),
        ]);
        assert_eq!(
            validate_row(4, &r),
            Err(ValidationError::IncompatibleUnit {
                unit: "furlongs".into(),
                activity_type: ActivityType::Transport,
            })
        );

        let r = row(&[
            ("activity_type", "transport"),
            ("category", "car_petrol"),
            ("amount", "10"),
            ("unit", "kWh"),
        ]);
        assert!(matches!(
            validate_row(0, &r),
            Err(ValidationError::IncompatibleUnit { .. })
        ));
    }

    #[test]
    fn date_forms() {
        let want = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for s in ["2024-03-15", "2024/03/15", "15/03/2024", "2024-03-15T10:30:00Z"] {
            assert_eq!(parse_date(s), Ok(want), "date {s:?}");
        }
        assert_eq!(
            parse_date("2024-02-30"),
            Err(ValidationError::InvalidDate("2024-02-30".into()))
        );
    }

    #[test]
    fn invalid_date_rejects_row() {
        let mut r = electricity();
        r.insert("date".into(), "yesterday".into());
        assert_eq!(
            validate_row(0, &r),
            Err(ValidationError::InvalidDate("yesterday".into()))
        );
    }

    #[test]
    fn blank_date_is_ignored() {
        let mut r = electricity();
        r.insert("date".into(), "".into());
        assert_eq!(validate_row(0, &r).unwrap().date, None);
    }

    #[test]
    fn report_keeps_good_rows_and_indexes_bad_ones() {
        let mut bad = electricity();
        bad.insert("amount".into(), "-5".into());
        let rows = vec![electricity(), bad, electricity()];

        let report = validate_rows(&rows);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].row, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn summary_counts_and_date_range() {
        let mut a = electricity();
        a.insert("date".into(), "2024-02-01".into());
        let mut b = row(&[
            ("activity_type", "fuel"),
            ("category", "diesel"),
            ("amount", "40"),
            ("unit", "litres"),
        ]);
        b.insert("date".into(), "2024-01-10".into());
        let mut c = electricity();
        c.insert("unit".into(), "kg".into());

        let summary = validate_rows(&[a, b, c]).summary();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(
            summary.activity_types,
            vec![ActivityType::Electricity, ActivityType::Fuel]
        );
        assert_eq!(summary.categories, vec!["diesel", "grid"]);
        assert_eq!(
            summary.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
            ))
        );
    }

    #[test]
    fn empty_upload() {
        let report = validate_rows(&[]);
        assert!(report.records.is_empty());
        assert!(report.is_clean());
        assert_eq!(report.summary().date_range, None);
    }

    #[test]
    fn row_error_serialises_with_kind() {
        let err = RowError {
            row: 2,
            error: ValidationError::InvalidAmount("x".into()),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["row"], 2);
        assert_eq!(json["error"]["kind"], "invalid_amount");
    }
}
