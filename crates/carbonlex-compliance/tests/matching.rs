//! Registry loading and matching through the public API.

use std::collections::BTreeSet;

use carbonlex_compliance::{
    ComplianceMatcher, MaterialDeclaration, RegulationRegistry, ScreeningStatus, screen,
};
use carbonlex_core::Region;

const BATTERY_REGISTRY: &str = r#"[
    {
        "id": "EU_BAT",
        "name": "Batteries Directive",
        "number": "2006/66/EC",
        "region": "eu",
        "scope": ["Batteries"],
        "authority": "European Commission",
        "official_url": "https://eur-lex.europa.eu/eli/dir/2006/66/oj",
        "legal_reference": "Directive 2006/66/EC",
        "verified": true,
        "restricted_substances": [
            {"substance": "mercury", "limit_ppm": 5.0},
            {"substance": "cadmium", "cas_number": "7440-43-9", "limit_ppm": 20.0}
        ]
    },
    {
        "id": "APAC_BAT",
        "name": "Regional battery rules",
        "number": "N/A",
        "region": "asia_pacific",
        "scope": ["batteries"],
        "authority": "Ministry",
        "official_url": "",
        "verified": true
    }
]"#;

#[test]
fn unverified_candidate_is_counted_but_not_surfaced() {
    let registry = RegulationRegistry::from_json(BATTERY_REGISTRY.as_bytes()).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(!registry.get("APAC_BAT").unwrap().verified);

    let regions: BTreeSet<Region> = [Region::Eu, Region::AsiaPacific].into_iter().collect();
    let result = ComplianceMatcher::new(&registry).match_regulations(&regions, "batteries");

    assert_eq!(result.len(), 1);
    let m = &result.matches[0];
    assert_eq!(m.regulation.id, "EU_BAT");
    assert_eq!(m.regulation.name, "Batteries Directive");
    assert_eq!(m.regulation.number, "2006/66/EC");
    assert_eq!(m.regulation.authority, "European Commission");
    assert_eq!(m.regulation.legal_reference, "Directive 2006/66/EC");
    assert_eq!(m.reason.region, Region::Eu);

    assert_eq!(result.audit.registry_total, 2);
    assert_eq!(result.audit.candidates, 2);
    assert_eq!(result.audit.matched, 1);
    assert_eq!(result.audit.excluded_unverified, 1);
}

#[test]
fn screening_uses_only_matched_regulations() {
    let registry = RegulationRegistry::from_json(BATTERY_REGISTRY.as_bytes()).unwrap();
    let matcher = ComplianceMatcher::new(&registry);
    let materials = [MaterialDeclaration {
        component: "Cell".into(),
        substance: "Cd".into(),
        concentration_ppm: 30.0,
        supplier: None,
    }];

    let eu: BTreeSet<Region> = [Region::Eu].into_iter().collect();
    let report = screen(&matcher.match_regulations(&eu, "batteries"), &materials);
    assert_eq!(report.assessments[0].status, ScreeningStatus::NonCompliant);
    assert_eq!(report.assessments[0].limit_ppm, Some(20.0));

    let apac: BTreeSet<Region> = [Region::AsiaPacific].into_iter().collect();
    let report = screen(&matcher.match_regulations(&apac, "batteries"), &materials);
    assert_eq!(report.assessments[0].status, ScreeningStatus::NotRestricted);
}

#[test]
fn result_serialises_for_storage() {
    let registry = RegulationRegistry::builtin().unwrap();
    let regions: BTreeSet<Region> = Region::ALL.into_iter().collect();
    let result = ComplianceMatcher::new(&registry).match_regulations(&regions, "packaging");
    let json = serde_json::to_string(&result).unwrap();
    let back: carbonlex_compliance::ComplianceResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
