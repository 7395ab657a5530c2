//! Screening declared material concentrations against matched regulations.
//!
//! For each declaration the applicable limit is the lowest `limit_ppm` any
//! matched regulation sets for that substance. Substances no matched
//! regulation restricts are reported as not restricted rather than compliant.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matcher::ComplianceResult;

/// A known hazardous substance and the names it is declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substance {
    pub name: &'static str,
    pub cas_number: Option<&'static str>,
    pub aliases: &'static [&'static str],
}

pub const SUBSTANCES: &[Substance] = &[
    Substance {
        name: "lead",
        cas_number: Some("7439-92-1"),
        aliases: &["pb", "lead (pb)"],
    },
    Substance {
        name: "cadmium",
        cas_number: Some("7440-43-9"),
        aliases: &["cd", "cadmium (cd)"],
    },
    Substance {
        name: "mercury",
        cas_number: Some("7439-97-6"),
        aliases: &["hg", "mercury (hg)"],
    },
    Substance {
        name: "hexavalent_chromium",
        cas_number: Some("18540-29-9"),
        aliases: &[
            "hexavalent chromium",
            "chromium vi",
            "chromium (vi)",
            "cr(vi)",
            "cr6+",
        ],
    },
    Substance {
        name: "chromium",
        cas_number: Some("7440-47-3"),
        aliases: &["cr", "chromium (cr)", "total chromium"],
    },
    Substance {
        name: "pbb",
        cas_number: None,
        aliases: &["polybrominated biphenyls"],
    },
    Substance {
        name: "pbde",
        cas_number: None,
        aliases: &["polybrominated diphenyl ethers"],
    },
    Substance {
        name: "dehp",
        cas_number: Some("117-81-7"),
        aliases: &["bis(2-ethylhexyl) phthalate"],
    },
    Substance {
        name: "bbp",
        cas_number: Some("85-68-7"),
        aliases: &["butyl benzyl phthalate"],
    },
    Substance {
        name: "dbp",
        cas_number: Some("84-74-2"),
        aliases: &["dibutyl phthalate"],
    },
    Substance {
        name: "dibp",
        cas_number: Some("84-69-5"),
        aliases: &["diisobutyl phthalate"],
    },
    Substance {
        name: "cobalt",
        cas_number: Some("7440-48-4"),
        aliases: &["co", "cobalt (co)"],
    },
];

/// Resolve a declared substance name, alias, or CAS number.
pub fn resolve_substance(declared: &str) -> Option<&'static Substance> {
    let key = declared.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let key = key.replace(' ', "_");
    SUBSTANCES.iter().find(|s| {
        s.name == key
            || s.cas_number == Some(key.as_str())
            || s.aliases.iter().any(|a| a.replace(' ', "_") == key)
    })
}

/// One row of a bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDeclaration {
    pub component: String,
    pub substance: String,
    pub concentration_ppm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    Compliant,
    NonCompliant,
    NotRestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// High above 90 % of the limit, medium from 50 %.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.9 {
            Self::High
        } else if ratio >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceAssessment {
    pub component: String,
    /// Canonical substance name, or the declared name when unrecognised.
    pub substance: String,
    pub cas_number: Option<String>,
    pub concentration_ppm: f64,
    pub limit_ppm: Option<f64>,
    /// Id of the regulation setting the applicable limit.
    pub limiting_regulation: Option<String>,
    pub status: ScreeningStatus,
    pub risk: Option<RiskLevel>,
    pub supplier: Option<String>,
}

impl SubstanceAssessment {
    /// Amount above the limit, for non-compliant items.
    pub fn excess_ppm(&self) -> Option<f64> {
        match (self.status, self.limit_ppm) {
            (ScreeningStatus::NonCompliant, Some(limit)) => Some(self.concentration_ppm - limit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub assessments: Vec<SubstanceAssessment>,
    /// Declarations with an applicable limit.
    pub assessed: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub not_restricted: usize,
    /// Percentage of assessed declarations that are compliant; 100 when none were assessed.
    pub compliance_rate: f64,
}

impl ScreeningReport {
    pub fn non_compliant_items(&self) -> impl Iterator<Item = &SubstanceAssessment> {
        self.assessments
            .iter()
            .filter(|a| a.status == ScreeningStatus::NonCompliant)
    }

    /// Supplier follow-ups for each non-compliant item.
    pub fn recommendations(&self) -> Vec<String> {
        self.non_compliant_items()
            .filter_map(|a| {
                let limit = a.limit_ppm?;
                let supplier = a.supplier.as_deref().unwrap_or("the supplier");
                Some(format!(
                    "Contact {supplier} about {} in {} ({} ppm exceeds the {} ppm limit)",
                    a.substance, a.component, a.concentration_ppm, limit
                ))
            })
            .collect()
    }
}

/// Screen declarations against the regulations in `result`.
pub fn screen(result: &ComplianceResult, materials: &[MaterialDeclaration]) -> ScreeningReport {
    let mut assessments = Vec::with_capacity(materials.len());

    for m in materials {
        let known = resolve_substance(&m.substance);
        let substance = known
            .map(|s| s.name.to_string())
            .unwrap_or_else(|| m.substance.trim().to_lowercase());

        let mut cas_number = known.and_then(|s| s.cas_number).map(String::from);
        let mut limit: Option<(f64, &str)> = None;
        for reg in result.regulations() {
            if let Some(l) = reg.limit_for(&substance)
                && limit.is_none_or(|(current, _)| l.limit_ppm < current)
            {
                limit = Some((l.limit_ppm, reg.id.as_str()));
                if cas_number.is_none() {
                    cas_number = l.cas_number.clone();
                }
            }
        }

        let (status, risk) = match limit {
            None => (ScreeningStatus::NotRestricted, None),
            Some((limit_ppm, _)) => {
                let ratio = if limit_ppm > 0.0 {
                    m.concentration_ppm / limit_ppm
                } else if m.concentration_ppm > 0.0 {
                    f64::INFINITY
                } else {
                    0.0
                };
                let status = if m.concentration_ppm <= limit_ppm {
                    ScreeningStatus::Compliant
                } else {
                    ScreeningStatus::NonCompliant
                };
                (status, Some(RiskLevel::from_ratio(ratio)))
            }
        };

        assessments.push(SubstanceAssessment {
            component: m.component.clone(),
            substance,
            cas_number,
            concentration_ppm: m.concentration_ppm,
            limit_ppm: limit.map(|(v, _)| v),
            limiting_regulation: limit.map(|(_, id)| id.to_string()),
            status,
            risk,
            supplier: m.supplier.clone(),
        });
    }

    let count = |s: ScreeningStatus| assessments.iter().filter(|a| a.status == s).count();
    let compliant = count(ScreeningStatus::Compliant);
    let non_compliant = count(ScreeningStatus::NonCompliant);
    let not_restricted = count(ScreeningStatus::NotRestricted);
    let assessed = compliant + non_compliant;
    let compliance_rate = if assessed == 0 {
        100.0
    } else {
        compliant as f64 / assessed as f64 * 100.0
    };

    info!(
        declarations = materials.len(),
        assessed,
        non_compliant,
        compliance_rate,
        "screened materials"
    );

    ScreeningReport {
        assessments,
        assessed,
        compliant,
        non_compliant,
        not_restricted,
        compliance_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ComplianceMatcher;
    use crate::registry::RegulationRegistry;
    use carbonlex_core::Region;
    use std::collections::BTreeSet;

    fn decl(component: &str, substance: &str, ppm: f64) -> MaterialDeclaration {
        MaterialDeclaration {
            component: component.into(),
            substance: substance.into(),
            concentration_ppm: ppm,
            supplier: Some("Acme".into()),
        }
    }

    fn electronics_in(regions: &[Region]) -> ComplianceResult {
        let registry = RegulationRegistry::builtin().unwrap();
        let regions: BTreeSet<Region> = regions.iter().copied().collect();
        ComplianceMatcher::new(&registry).match_regulations(&regions, "electronics")
    }

    #[test]
    fn resolves_aliases_and_cas_numbers() {
        assert_eq!(resolve_substance("Lead (Pb)").unwrap().name, "lead");
        assert_eq!(resolve_substance("PB").unwrap().name, "lead");
        assert_eq!(resolve_substance("7440-43-9").unwrap().name, "cadmium");
        assert_eq!(resolve_substance("Cr(VI)").unwrap().name, "hexavalent_chromium");
        assert_eq!(
            resolve_substance("Dibutyl  Phthalate").unwrap().name,
            "dbp"
        );
        assert!(resolve_substance("gold").is_none());
    }

    #[test]
    fn total_chromium_is_not_hexavalent() {
        let cr = resolve_substance("Cr").unwrap();
        assert_eq!(cr.name, "chromium");
        assert_eq!(cr.cas_number, Some("7440-47-3"));
        assert_eq!(resolve_substance("Chromium").unwrap().name, "chromium");
        assert_eq!(
            resolve_substance("18540-29-9").unwrap().name,
            "hexavalent_chromium"
        );

        let report = screen(&electronics_in(&[Region::Eu]), &[decl("Plating", "Cr", 5000.0)]);
        assert_eq!(report.assessments[0].cas_number.as_deref(), Some("7440-47-3"));
        assert_eq!(report.assessments[0].status, ScreeningStatus::NotRestricted);
    }

    #[test]
    fn risk_thresholds() {
        assert_eq!(RiskLevel::from_ratio(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_ratio(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_ratio(0.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_ratio(0.91), RiskLevel::High);
        assert_eq!(RiskLevel::from_ratio(3.0), RiskLevel::High);
    }

    #[test]
    fn eu_rohs_limits_apply() {
        let result = electronics_in(&[Region::Eu]);
        let report = screen(
            &result,
            &[
                decl("Solder joint", "Lead (Pb)", 850.0),
                decl("Plating", "Cd", 150.0),
                decl("Connector", "Gold", 45.0),
            ],
        );

        let solder = &report.assessments[0];
        assert_eq!(solder.substance, "lead");
        assert_eq!(solder.cas_number.as_deref(), Some("7439-92-1"));
        assert_eq!(solder.limit_ppm, Some(1000.0));
        assert_eq!(solder.status, ScreeningStatus::Compliant);
        assert_eq!(solder.risk, Some(RiskLevel::Medium));

        let plating = &report.assessments[1];
        assert_eq!(plating.status, ScreeningStatus::NonCompliant);
        assert_eq!(plating.excess_ppm(), Some(50.0));

        assert_eq!(report.assessments[2].status, ScreeningStatus::NotRestricted);
        assert_eq!(report.assessments[2].risk, None);

        assert_eq!(report.assessed, 2);
        assert_eq!(report.compliant, 1);
        assert_eq!(report.non_compliant, 1);
        assert_eq!(report.not_restricted, 1);
        assert_eq!(report.compliance_rate, 50.0);
    }

    #[test]
    fn most_restrictive_limit_wins() {
        // CPSIA caps lead at 100 ppm, below RoHS-style limits.
        let result = electronics_in(&[Region::Eu, Region::Other]);
        let report = screen(&result, &[decl("Housing", "lead", 850.0)]);
        let a = &report.assessments[0];
        assert_eq!(a.limit_ppm, Some(100.0));
        assert_eq!(a.limiting_regulation.as_deref(), Some("OTHER_001"));
        assert_eq!(a.status, ScreeningStatus::NonCompliant);
        assert_eq!(a.risk, Some(RiskLevel::High));
    }

    #[test]
    fn nothing_assessed_is_fully_compliant() {
        let result = electronics_in(&[]);
        let report = screen(&result, &[decl("Housing", "lead", 850.0)]);
        assert_eq!(report.assessed, 0);
        assert_eq!(report.compliance_rate, 100.0);
        assert!(report.recommendations().is_empty());
    }

    #[test]
    fn recommendations_name_the_supplier() {
        let result = electronics_in(&[Region::Eu]);
        let report = screen(&result, &[decl("Plating", "cadmium", 150.0)]);
        assert_eq!(
            report.recommendations(),
            vec!["Contact Acme about cadmium in Plating (150 ppm exceeds the 100 ppm limit)"]
        );
    }
}
