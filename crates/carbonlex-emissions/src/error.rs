use carbonlex_core::{ActivityType, ConversionError, Unit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single upload row was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing required column {0:?}")]
    MissingColumn(String),

    #[error("unknown activity type {0:?}")]
    UnknownActivityType(String),

    #[error("invalid amount {0:?}: expected a finite number >= 0")]
    InvalidAmount(String),

    #[error("unit {unit:?} is not valid for {activity_type}")]
    IncompatibleUnit {
        unit: String,
        activity_type: ActivityType,
    },

    #[error("invalid date {0:?}")]
    InvalidDate(String),
}

/// Errors raised while building or loading a factor table.
#[derive(Debug, Error)]
pub enum FactorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate factor for {activity_type} in {unit} (category {category:?}, region {region:?})")]
    DuplicateFactor {
        activity_type: ActivityType,
        unit: Unit,
        category: Option<String>,
        region: Option<String>,
    },

    #[error("invalid factor for {activity_type} in {unit}: {reason}")]
    InvalidFactor {
        activity_type: ActivityType,
        unit: Unit,
        reason: String,
    },
}

/// No factor prices this activity in this unit.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot price activity {activity_type} in unit {unit}")]
pub struct UnknownEmissionFactor {
    pub activity_type: ActivityType,
    pub unit: Unit,
}

/// Run-fatal calculation errors. A run that fails produces no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("record {index} (row {row}): cannot price activity {activity_type} in unit {unit}")]
    UnknownEmissionFactor {
        index: usize,
        row: usize,
        activity_type: ActivityType,
        unit: Unit,
    },

    #[error("record {index} (row {row}): internal unit conversion fault: {source}")]
    Conversion {
        index: usize,
        row: usize,
        source: ConversionError,
    },

    #[error("record {index} (row {row}): emissions are not a finite number")]
    NonFiniteEmission { index: usize, row: usize },

    #[error("total emissions are not a finite number")]
    NonFiniteTotal,
}
