//! Regulation registry, compliance matching, and material screening.

mod error;
pub mod export;
pub mod matcher;
pub mod registry;
pub mod screening;

pub use error::RegistryError;
pub use matcher::{
    AuditCounts, ComplianceMatcher, ComplianceQuery, ComplianceResult, MatchReason,
    RegulationMatch,
};
pub use registry::RegulationRegistry;
pub use screening::{
    MaterialDeclaration, RiskLevel, ScreeningReport, ScreeningStatus, SubstanceAssessment,
    resolve_substance, screen,
};
