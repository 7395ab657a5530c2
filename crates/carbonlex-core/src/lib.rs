pub mod activity;
pub mod regulation;
pub mod schema;
pub mod units;

pub use activity::{ActivityRecord, ActivityType, GhgScope, ParseActivityError, normalize_category};
pub use regulation::{
    ParseRegionError, Region, Regulation, RegulationStatus, SubstanceLimit, normalize_term,
};
pub use schema::reporting;
pub use units::{ConversionError, Quantity, Unit, UnitFamily, convert, normalize};
