//! Regulation records shared by the registry, matcher, and reporting layers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region {0:?}")]
pub struct ParseRegionError(pub String);

/// Jurisdictional grouping a regulation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Eu,
    AsiaPacific,
    Other,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Eu, Region::AsiaPacific, Region::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eu => "eu",
            Self::AsiaPacific => "asia_pacific",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Eu => "EU",
            Self::AsiaPacific => "Asia-Pacific",
            Self::Other => "Other",
        }
    }

    /// Parse a region name. Accepts `eu`, `europe`, `asia_pacific`, `apac`,
    /// `asia-pacific`, `other`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "eu" | "europe" | "european_union" => Some(Self::Eu),
            "asia_pacific" | "apac" | "asia" => Some(Self::AsiaPacific),
            "other" | "other_regions" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseRegionError(s.to_string()))
    }
}

/// Lifecycle state of a regulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationStatus {
    #[default]
    Active,
    Upcoming,
    UnderReview,
}

impl RegulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::UnderReview => "under_review",
        }
    }
}

/// Maximum permitted concentration of one substance in a homogeneous material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceLimit {
    /// Canonical substance name, e.g. `lead`, `dehp`.
    pub substance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
    pub limit_ppm: f64,
}

/// One entry in the regulation registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    /// Stable registry identifier, e.g. `EU_001`.
    pub id: String,
    pub name: String,
    /// Jurisdiction-specific identifier, e.g. `2011/65/EU`.
    pub number: String,
    pub region: Region,
    #[serde(default)]
    pub country: String,
    /// Product and material categories the regulation applies to.
    pub scope: BTreeSet<String>,
    #[serde(default)]
    pub requirements: String,
    pub authority: String,
    #[serde(default)]
    pub official_url: String,
    #[serde(default)]
    pub legal_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eur_lex_link: Option<String>,
    #[serde(default)]
    pub status: RegulationStatus,
    /// True only when `official_url` points at an authoritative publication.
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub restricted_substances: Vec<SubstanceLimit>,
}

impl Regulation {
    /// The scope term matching `category`, if any. Exact, case-insensitive.
    pub fn scope_term_for(&self, category: &str) -> Option<&str> {
        let wanted = normalize_term(category);
        if wanted.is_empty() {
            return None;
        }
        self.scope
            .iter()
            .find(|term| normalize_term(term) == wanted)
            .map(String::as_str)
    }

    pub fn covers(&self, category: &str) -> bool {
        self.scope_term_for(category).is_some()
    }

    /// The limit this regulation sets for `substance`, if it restricts it.
    pub fn limit_for(&self, substance: &str) -> Option<&SubstanceLimit> {
        let wanted = normalize_term(substance);
        self.restricted_substances
            .iter()
            .find(|l| normalize_term(&l.substance) == wanted)
    }
}

/// Trim and lower-case a scope term or category for comparison.
pub fn normalize_term(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Regulation {
        Regulation {
            id: "EU_001".into(),
            name: "RoHS Directive".into(),
            number: "2011/65/EU".into(),
            region: Region::Eu,
            country: "European Union".into(),
            scope: ["electronics", "Batteries"].into_iter().map(String::from).collect(),
            requirements: "Restricts hazardous substances".into(),
            authority: "European Commission".into(),
            official_url: "https://eur-lex.europa.eu/eli/dir/2011/65/oj".into(),
            legal_reference: "Directive 2011/65/EU".into(),
            eur_lex_link: None,
            status: RegulationStatus::Active,
            verified: true,
            restricted_substances: vec![SubstanceLimit {
                substance: "lead".into(),
                cas_number: Some("7439-92-1".into()),
                limit_ppm: 1000.0,
            }],
        }
    }

    #[test]
    fn region_parse_aliases() {
        assert_eq!(Region::parse("EU"), Some(Region::Eu));
        assert_eq!(Region::parse("apac"), Some(Region::AsiaPacific));
        assert_eq!(Region::parse("Asia-Pacific"), Some(Region::AsiaPacific));
        assert_eq!(Region::parse("other"), Some(Region::Other));
        assert_eq!(Region::parse("mars"), None);
    }

    #[test]
    fn region_serde_round_trip() {
        let json = serde_json::to_string(&Region::AsiaPacific).unwrap();
        assert_eq!(json, "\"asia_pacific\"");
        let r: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(r, Region::AsiaPacific);
    }

    #[test]
    fn scope_match_is_exact_and_case_insensitive() {
        let reg = sample();
        assert_eq!(reg.scope_term_for("  BATTERIES "), Some("Batteries"));
        assert!(reg.covers("electronics"));
        assert!(!reg.covers("battery"));
        assert!(!reg.covers("electr"));
        assert!(!reg.covers(""));
    }

    #[test]
    fn limit_lookup() {
        let reg = sample();
        assert_eq!(reg.limit_for("Lead").map(|l| l.limit_ppm), Some(1000.0));
        assert!(reg.limit_for("mercury").is_none());
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let json = r#"{
            "id": "X_1", "name": "X", "number": "1", "region": "other",
            "scope": ["toys"], "authority": "A"
        }"#;
        let reg: Regulation = serde_json::from_str(json).unwrap();
        assert_eq!(reg.status, RegulationStatus::Active);
        assert!(!reg.verified);
        assert!(reg.official_url.is_empty());
        assert!(reg.restricted_substances.is_empty());
    }

    #[test]
    fn status_names_match_serde() {
        for status in [
            RegulationStatus::Active,
            RegulationStatus::Upcoming,
            RegulationStatus::UnderReview,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
