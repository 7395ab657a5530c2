//! Region and category matching against the verified part of the registry.

use std::collections::BTreeSet;

use carbonlex_core::{Region, Regulation, normalize_term};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::registry::RegulationRegistry;

/// Why a regulation was included in a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReason {
    /// The requested region the regulation belongs to.
    pub region: Region,
    /// The scope term that matched the category. `None` for region-only queries.
    pub scope_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationMatch {
    pub regulation: Regulation,
    pub reason: MatchReason,
}

/// Counts disclosed alongside every result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCounts {
    /// Entries in the registry, verified or not.
    pub registry_total: usize,
    /// Entries matching region and category before the verified filter.
    pub candidates: usize,
    pub matched: usize,
    /// Candidates dropped because they are unverified.
    pub excluded_unverified: usize,
}

/// The normalised query a result answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceQuery {
    pub regions: Vec<Region>,
    /// `None` for region-only queries.
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub query: ComplianceQuery,
    /// Matches in registry order.
    pub matches: Vec<RegulationMatch>,
    pub audit: AuditCounts,
}

impl ComplianceResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn regulations(&self) -> impl Iterator<Item = &Regulation> {
        self.matches.iter().map(|m| &m.regulation)
    }
}

/// Answers compliance queries against a borrowed registry.
#[derive(Debug, Clone)]
pub struct ComplianceMatcher<'a> {
    registry: &'a RegulationRegistry,
}

impl<'a> ComplianceMatcher<'a> {
    pub fn new(registry: &'a RegulationRegistry) -> Self {
        Self { registry }
    }

    /// Verified regulations in one of `regions` whose scope contains `category`.
    ///
    /// An empty region set or an unmatched category yields an empty result,
    /// never an error.
    pub fn match_regulations(&self, regions: &BTreeSet<Region>, category: &str) -> ComplianceResult {
        let category = normalize_term(category);
        let result = self.run(regions, Some(category.as_str()));
        info!(
            regions = ?result.query.regions,
            category = %category,
            matched = result.audit.matched,
            excluded_unverified = result.audit.excluded_unverified,
            "compliance match"
        );
        result
    }

    /// Verified regulations in one of `regions`, whatever their scope.
    pub fn applicable_in(&self, regions: &BTreeSet<Region>) -> ComplianceResult {
        let result = self.run(regions, None);
        info!(
            regions = ?result.query.regions,
            matched = result.audit.matched,
            "region applicability"
        );
        result
    }

    fn run(&self, regions: &BTreeSet<Region>, category: Option<&str>) -> ComplianceResult {
        let mut audit = AuditCounts {
            registry_total: self.registry.len(),
            ..AuditCounts::default()
        };
        let mut matches = Vec::new();

        for reg in self.registry.iter() {
            if !regions.contains(&reg.region) {
                continue;
            }
            let scope_term = match category {
                Some(cat) => match reg.scope_term_for(cat) {
                    Some(term) => Some(term.to_string()),
                    None => continue,
                },
                None => None,
            };
            audit.candidates += 1;
            if !reg.verified {
                audit.excluded_unverified += 1;
                continue;
            }
            matches.push(RegulationMatch {
                regulation: reg.clone(),
                reason: MatchReason {
                    region: reg.region,
                    scope_term,
                },
            });
        }
        audit.matched = matches.len();

        ComplianceResult {
            query: ComplianceQuery {
                regions: regions.iter().copied().collect(),
                category: category.map(String::from),
            },
            matches,
            audit,
        }
    }
}
