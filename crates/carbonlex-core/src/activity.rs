//! Business-activity records and their classification.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::{Unit, UnitFamily};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity type {0:?}")]
pub struct ParseActivityError(pub String);

/// The kind of business activity a record describes.
///
/// Each activity type has a single unit family and a GHG Protocol scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Electricity,
    NaturalGas,
    Fuel,
    Transport,
    Heating,
    Cooling,
    PurchasedGoods,
    Waste,
    Water,
    Refrigerants,
    Manufacturing,
    BusinessTravel,
    EmployeeCommuting,
    Investments,
}

impl ActivityType {
    pub const ALL: [ActivityType; 14] = [
        ActivityType::Electricity,
        ActivityType::NaturalGas,
        ActivityType::Fuel,
        ActivityType::Transport,
        ActivityType::Heating,
        ActivityType::Cooling,
        ActivityType::PurchasedGoods,
        ActivityType::Waste,
        ActivityType::Water,
        ActivityType::Refrigerants,
        ActivityType::Manufacturing,
        ActivityType::BusinessTravel,
        ActivityType::EmployeeCommuting,
        ActivityType::Investments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::NaturalGas => "natural_gas",
            Self::Fuel => "fuel",
            Self::Transport => "transport",
            Self::Heating => "heating",
            Self::Cooling => "cooling",
            Self::PurchasedGoods => "purchased_goods",
            Self::Waste => "waste",
            Self::Water => "water",
            Self::Refrigerants => "refrigerants",
            Self::Manufacturing => "manufacturing",
            Self::BusinessTravel => "business_travel",
            Self::EmployeeCommuting => "employee_commuting",
            Self::Investments => "investments",
        }
    }

    /// Parse an upload value. Accepts the snake_case names plus a few legacy
    /// spellings (`transportation`, `gas`, `travel`, `commuting`).
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        if let Some(t) = Self::ALL.into_iter().find(|t| t.as_str() == key) {
            return Some(t);
        }
        match key.as_str() {
            "transportation" => Some(Self::Transport),
            "gas" => Some(Self::NaturalGas),
            "travel" => Some(Self::BusinessTravel),
            "commuting" => Some(Self::EmployeeCommuting),
            _ => None,
        }
    }

    /// The unit family amounts of this activity must be given in.
    pub fn unit_family(&self) -> UnitFamily {
        match self {
            Self::Electricity | Self::NaturalGas | Self::Heating | Self::Cooling => {
                UnitFamily::Energy
            }
            Self::Fuel | Self::Water => UnitFamily::Volume,
            Self::Transport | Self::BusinessTravel | Self::EmployeeCommuting => {
                UnitFamily::Distance
            }
            Self::Waste | Self::Refrigerants | Self::Manufacturing => UnitFamily::Mass,
            Self::PurchasedGoods | Self::Investments => UnitFamily::Currency,
        }
    }

    /// Whether `unit` may be used for this activity.
    pub fn accepts(&self, unit: Unit) -> bool {
        self.unit_family().contains(unit)
    }

    pub fn ghg_scope(&self) -> GhgScope {
        match self {
            Self::NaturalGas
            | Self::Fuel
            | Self::Heating
            | Self::Refrigerants
            | Self::Manufacturing => GhgScope::Scope1,
            Self::Electricity | Self::Cooling => GhgScope::Scope2,
            Self::Transport
            | Self::PurchasedGoods
            | Self::Waste
            | Self::Water
            | Self::BusinessTravel
            | Self::EmployeeCommuting
            | Self::Investments => GhgScope::Scope3,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ParseActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseActivityError(s.to_string()))
    }
}

/// GHG Protocol emission scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GhgScope {
    /// Direct emissions from owned or controlled sources.
    #[serde(rename = "scope_1")]
    Scope1,
    /// Indirect emissions from purchased energy.
    #[serde(rename = "scope_2")]
    Scope2,
    /// All other value-chain emissions.
    #[serde(rename = "scope_3")]
    Scope3,
}

impl GhgScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scope1 => "scope_1",
            Self::Scope2 => "scope_2",
            Self::Scope3 => "scope_3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scope1 => "Scope 1 (direct)",
            Self::Scope2 => "Scope 2 (purchased energy)",
            Self::Scope3 => "Scope 3 (value chain)",
        }
    }
}

impl fmt::Display for GhgScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated input row.
///
/// Built by the upload validator; `row` is the 0-based index of the source row
/// so that downstream failures can point back at the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub row: usize,
    pub activity_type: ActivityType,
    /// Free-form sub-classification, normalised with [`normalize_category`].
    pub category: String,
    pub amount: f64,
    pub unit: Unit,
    pub date: Option<NaiveDate>,
}

impl ActivityRecord {
    pub fn new(activity_type: ActivityType, category: &str, amount: f64, unit: Unit) -> Self {
        Self {
            row: 0,
            activity_type,
            category: normalize_category(category),
            amount,
            unit,
            date: None,
        }
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Lower-case a category and replace whitespace runs with `_`.
///
/// "Grid Electricity" and "grid_electricity" name the same category.
pub fn normalize_category(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}
