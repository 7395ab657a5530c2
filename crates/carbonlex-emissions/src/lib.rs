//! Emission pipeline: validate uploads, normalise units, price records in CO2e.

pub mod calculator;
mod error;
pub mod export;
pub mod factors;
pub mod result;
pub mod validate;

pub use calculator::EmissionsCalculator;
pub use error::{CalcError, FactorError, UnknownEmissionFactor, ValidationError};
pub use factors::{EmissionFactor, FactorTable, FactorTableBuilder};
pub use result::{EmissionResult, MAX_RECOMMENDATIONS, MonthlyEmission, RecordEmission};
pub use validate::{RawRow, RowError, ValidationReport, ValidationSummary, validate_rows};
