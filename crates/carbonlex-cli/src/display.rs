//! Text rendering for calculation, compliance, and history output.
//!
//! Results print as vertical cards grouped into sections; tabular parts
//! (the monthly series) go through Arrow's pretty printer.

use carbonlex_compliance::{ComplianceResult, ScreeningReport, ScreeningStatus};
use carbonlex_core::{Region, Regulation, RegulationStatus};
use carbonlex_emissions::{EmissionFactor, EmissionResult, ValidationReport, export};
use carbonlex_store::HistoryEntry;

const MAX_LIST_ITEMS: usize = 10;

// ── Calculation ──

pub fn print_validation(report: &ValidationReport) {
    let summary = report.summary();
    println!("Upload");
    println!("  {:<26} {}", "rows", summary.total_rows);
    println!("  {:<26} {}", "accepted", summary.accepted);
    println!("  {:<26} {}", "rejected", summary.rejected);
    if let Some((from, to)) = summary.date_range {
        println!("  {:<26} {} to {}", "dates", from, to);
    }
    if !summary.categories.is_empty() {
        println!("  {:<26} {}", "categories", summary.categories.join(", "));
    }
    println!();

    if report.errors.is_empty() {
        return;
    }
    println!("Rejected rows ({}):", report.errors.len());
    for e in report.errors.iter().take(MAX_LIST_ITEMS) {
        println!("    row {:<6} {}", e.row + 1, e.error);
    }
    if report.errors.len() > MAX_LIST_ITEMS {
        println!("    ... and {} more", report.errors.len() - MAX_LIST_ITEMS);
    }
    println!();
}

/// Print an emission result as a card.
pub fn print_emissions(result: &EmissionResult) -> anyhow::Result<()> {
    println!("=== Carbon footprint ===");
    println!(
        "{:.2} kg CO2e ({:.3} t)",
        result.total_co2_kg(),
        result.total_tonnes()
    );
    println!();

    println!("Summary");
    println!("  {:<26} {}", "records", result.records().len());
    if let Some(region) = result.region() {
        println!("  {:<26} {}", "factor region", region);
    }
    if let Some((from, to)) = result.date_range() {
        println!("  {:<26} {} to {}", "period", from, to);
    }
    println!();

    print_breakdown(
        "By activity",
        result.total_co2_kg(),
        result
            .top_activities()
            .into_iter()
            .map(|(a, kg)| (a.to_string(), kg)),
    );
    print_breakdown(
        "By scope",
        result.total_co2_kg(),
        result
            .by_scope()
            .iter()
            .map(|(s, kg)| (s.label().to_string(), *kg)),
    );
    print_breakdown(
        "By category",
        result.total_co2_kg(),
        result.by_category().iter().map(|(c, kg)| (c.clone(), *kg)),
    );

    if result.monthly().is_some() {
        println!("Monthly");
        let batch = export::monthly_batch(result)?;
        arrow::util::pretty::print_batches(&[batch])?;
        println!();
    }

    let recommendations = result.recommendations();
    if !recommendations.is_empty() {
        println!("Recommendations");
        for r in recommendations {
            println!("  - {r}");
        }
        println!();
    }
    Ok(())
}

fn print_breakdown(header: &str, total: f64, rows: impl Iterator<Item = (String, f64)>) {
    let rows: Vec<(String, f64)> = rows.collect();
    if rows.is_empty() {
        return;
    }
    println!("{header}");
    for (name, kg) in rows {
        let share = if total > 0.0 { kg / total * 100.0 } else { 0.0 };
        println!("  {:<26} {:>12.2} kg  {:>5.1}%", name, kg, share);
    }
    println!();
}

// ── Compliance ──

pub fn print_compliance(result: &ComplianceResult) {
    let regions: Vec<&str> = result.query.regions.iter().map(Region::label).collect();
    println!("=== Compliance ===");
    println!(
        "{} | {}",
        if regions.is_empty() {
            "(no regions)".to_string()
        } else {
            regions.join(", ")
        },
        result.query.category.as_deref().unwrap_or("(all categories)")
    );
    println!();

    println!("Audit");
    println!("  {:<26} {}", "registry entries", result.audit.registry_total);
    println!("  {:<26} {}", "candidates", result.audit.candidates);
    println!("  {:<26} {}", "matched", result.audit.matched);
    println!(
        "  {:<26} {}",
        "excluded (unverified)", result.audit.excluded_unverified
    );
    println!();

    if result.is_empty() {
        println!("No verified regulations apply.");
        println!();
        return;
    }

    println!("Regulations ({}):", result.len());
    for m in &result.matches {
        print_regulation_line(&m.regulation);
        if let Some(term) = &m.reason.scope_term {
            println!("      matched on: {} / {}", m.reason.region.label(), term);
        }
    }
    println!();
}

pub fn print_screening(report: &ScreeningReport) {
    println!("Material screening");
    println!("  {:<26} {}", "assessed", report.assessed);
    println!("  {:<26} {}", "compliant", report.compliant);
    println!("  {:<26} {}", "non-compliant", report.non_compliant);
    println!("  {:<26} {}", "not restricted", report.not_restricted);
    println!("  {:<26} {:.1}%", "compliance rate", report.compliance_rate);
    println!();

    for a in &report.assessments {
        let status = match a.status {
            ScreeningStatus::Compliant => "ok",
            ScreeningStatus::NonCompliant => "FAIL",
            ScreeningStatus::NotRestricted => "-",
        };
        print!(
            "    {:<4} {:<20} {:<16} {:>10} ppm",
            status, a.component, a.substance, a.concentration_ppm
        );
        if let (Some(limit), Some(reg)) = (a.limit_ppm, &a.limiting_regulation) {
            print!("  (limit {} ppm, {})", limit, reg);
        }
        if let Some(risk) = a.risk {
            print!("  risk: {risk:?}");
        }
        println!();
    }
    println!();

    let recommendations = report.recommendations();
    if !recommendations.is_empty() {
        println!("Recommendations");
        for r in recommendations {
            println!("  - {r}");
        }
        println!();
    }
}

// ── Registry ──

pub fn print_regulations(regs: &[&Regulation]) {
    println!("Regulations ({}):", regs.len());
    for r in regs {
        print_regulation_line(r);
    }
}

fn print_regulation_line(r: &Regulation) {
    let name = if r.name.chars().count() > 60 {
        format!("{}...", r.name.chars().take(57).collect::<String>())
    } else {
        r.name.clone()
    };
    print!("    {:<10} {:<62} {}", r.id, name, r.number);
    if r.status != RegulationStatus::Active {
        print!("  [{}]", r.status.as_str());
    }
    if !r.verified {
        print!("  [unverified]");
    }
    println!();
    if !r.official_url.is_empty() {
        println!("      {}", r.official_url);
    }
}

// ── Factors ──

pub fn print_factors(factors: &[&EmissionFactor]) {
    println!("Emission factors ({}):", factors.len());
    for f in factors {
        print!(
            "    {:<20} {:<18} {:>10} kg/{}",
            f.activity_type.as_str(),
            f.category.as_deref().unwrap_or("-"),
            f.factor,
            f.unit
        );
        if let Some(region) = &f.valid_region {
            print!("  [{region}]");
        }
        println!();
        println!("      {}", f.source);
    }
}

// ── History ──

pub fn print_history(user: &str, entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No saved calculations for {user}.");
        return;
    }
    println!("History for {user} ({}):", entries.len());
    for e in entries {
        println!(
            "    #{:<5} {}  {:>6} rows  {:>14.2} kg CO2e",
            e.id,
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.row_count,
            e.result.total_co2_kg()
        );
    }
}
