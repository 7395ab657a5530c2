//! `carbonlex` command-line entry point.
//!
//! Builds the factor table and the regulation registry once, then runs one
//! subcommand against them.

mod display;
mod ingest;

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use carbonlex_compliance::{ComplianceMatcher, RegulationRegistry, screen};
use carbonlex_core::{ActivityType, Region, Regulation};
use carbonlex_emissions::{
    EmissionFactor, EmissionsCalculator, FactorTable, export, validate_rows,
};
use carbonlex_store::HistoryStore;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Carbon footprint estimation and regulatory compliance screening.
#[derive(Parser, Debug)]
#[command(name = "carbonlex", version, about, long_about = None)]
struct Cli {
    /// Emission factor table (JSON) to use instead of the built-in one.
    #[arg(long, env = "CARBONLEX_FACTORS", global = true)]
    factors: Option<PathBuf>,

    /// Regulation registry (JSON) to use instead of the built-in one.
    #[arg(long, env = "CARBONLEX_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Directory holding saved calculations.
    #[arg(
        long,
        env = "CARBONLEX_HISTORY_DIR",
        default_value = ".carbonlex/history",
        global = true
    )]
    history_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an activity CSV and compute its carbon footprint.
    Calculate {
        /// CSV with columns activity_type, category, amount, unit[, date].
        csv: PathBuf,

        /// Region used to pick region-specific emission factors.
        #[arg(long, env = "CARBONLEX_REGION")]
        region: Option<String>,

        /// Print the validation report and result as JSON.
        #[arg(long)]
        json: bool,

        /// Write records.arrow and monthly.arrow (Arrow IPC) into this directory.
        #[arg(long)]
        arrow_out: Option<PathBuf>,

        /// Save the result to this user's history.
        #[arg(long)]
        user: Option<String>,
    },

    /// Match verified regulations for regions and a product category.
    Comply {
        /// Region to include (eu, asia_pacific/apac, other). Repeatable.
        #[arg(long = "region", required = true)]
        regions: Vec<Region>,

        /// Product category, e.g. batteries. Omit to list everything in the regions.
        #[arg(long)]
        category: Option<String>,

        /// Material declarations to screen (component, substance, concentration_ppm[, supplier]).
        #[arg(long)]
        materials: Option<PathBuf>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Write matches.arrow (Arrow IPC) into this directory.
        #[arg(long)]
        arrow_out: Option<PathBuf>,
    },

    /// List the regulation registry.
    Regulations {
        #[arg(long)]
        region: Option<Region>,

        /// Case-insensitive keyword over name, scope, and requirements.
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        verified_only: bool,
    },

    /// List the emission factor table.
    Factors {
        /// Only factors for this activity type.
        #[arg(long)]
        activity: Option<ActivityType>,
    },

    /// List saved calculations for a user, newest first.
    History {
        #[arg(long)]
        user: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Delete the saved calculation with this id instead of listing.
        #[arg(long)]
        delete: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("carbonlex v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Commands::Calculate {
            ref csv,
            ref region,
            json,
            ref arrow_out,
            ref user,
        } => {
            let factors = load_factors(cli.factors.as_deref())?;
            cmd_calculate(
                &factors,
                csv,
                region.clone(),
                json,
                arrow_out.as_deref(),
                user.as_deref(),
                &cli.history_dir,
            )
        }
        Commands::Comply {
            ref regions,
            ref category,
            ref materials,
            json,
            ref arrow_out,
        } => {
            let registry = load_registry(cli.registry.as_deref())?;
            cmd_comply(
                &registry,
                regions,
                category.as_deref(),
                materials.as_deref(),
                json,
                arrow_out.as_deref(),
            )
        }
        Commands::Regulations {
            region,
            ref search,
            verified_only,
        } => {
            let registry = load_registry(cli.registry.as_deref())?;
            cmd_regulations(&registry, region, search.as_deref(), verified_only);
            Ok(())
        }
        Commands::Factors { activity } => {
            let factors = load_factors(cli.factors.as_deref())?;
            let entries: Vec<&EmissionFactor> = factors
                .entries()
                .into_iter()
                .filter(|f| activity.is_none_or(|a| f.activity_type == a))
                .collect();
            display::print_factors(&entries);
            Ok(())
        }
        Commands::History {
            ref user,
            limit,
            delete,
        } => {
            let store = HistoryStore::open(&cli.history_dir)
                .with_context(|| format!("opening history at {}", cli.history_dir.display()))?;
            if let Some(id) = delete {
                if !store.delete(user, id)? {
                    anyhow::bail!("no saved calculation #{id} for {user}");
                }
                println!("Deleted #{id}");
                return Ok(());
            }
            let entries = store.list(user, limit)?;
            display::print_history(user, &entries);
            Ok(())
        }
    }
}

// ── Startup ──

fn load_factors(path: Option<&Path>) -> anyhow::Result<FactorTable> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            FactorTable::from_json(std::io::BufReader::new(file))
                .with_context(|| format!("loading factor table {}", p.display()))
        }
        None => FactorTable::builtin().context("loading built-in factor table"),
    }
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<RegulationRegistry> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            RegulationRegistry::from_json(std::io::BufReader::new(file))
                .with_context(|| format!("loading registry {}", p.display()))
        }
        None => RegulationRegistry::builtin().context("loading built-in registry"),
    }
}

// ── Subcommands ──

fn cmd_calculate(
    factors: &FactorTable,
    csv: &Path,
    region: Option<String>,
    json: bool,
    arrow_out: Option<&Path>,
    user: Option<&str>,
    history_dir: &Path,
) -> anyhow::Result<()> {
    let rows = ingest::read_activity_csv(csv)?;
    let report = validate_rows(&rows);
    let result = EmissionsCalculator::new(factors)
        .with_region(region)
        .calculate(&report.records)?;

    if let Some(dir) = arrow_out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        write_ipc(&dir.join("records.arrow"), &export::records_batch(&result)?)?;
        write_ipc(&dir.join("monthly.arrow"), &export::monthly_batch(&result)?)?;
    }

    let saved = match user {
        Some(user) => {
            let store = HistoryStore::open(history_dir)
                .with_context(|| format!("opening history at {}", history_dir.display()))?;
            Some(store.save(user, &result, report.total_rows)?)
        }
        None => None,
    };

    if json {
        let out = serde_json::json!({
            "validation": {
                "summary": report.summary(),
                "errors": report.errors,
            },
            "result": result,
            "history_id": saved,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    display::print_validation(&report);
    display::print_emissions(&result)?;
    if let Some(id) = saved {
        println!("Saved as #{id}");
    }
    Ok(())
}

fn cmd_comply(
    registry: &RegulationRegistry,
    regions: &[Region],
    category: Option<&str>,
    materials: Option<&Path>,
    json: bool,
    arrow_out: Option<&Path>,
) -> anyhow::Result<()> {
    let regions: BTreeSet<Region> = regions.iter().copied().collect();
    let matcher = ComplianceMatcher::new(registry);
    let result = match category {
        Some(c) => matcher.match_regulations(&regions, c),
        None => matcher.applicable_in(&regions),
    };
    let screening = match materials {
        Some(path) => Some(screen(&result, &ingest::read_materials_csv(path)?)),
        None => None,
    };

    if let Some(dir) = arrow_out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        write_ipc(
            &dir.join("matches.arrow"),
            &carbonlex_compliance::export::matches_batch(&result)?,
        )?;
    }

    if json {
        let out = serde_json::json!({
            "compliance": result,
            "screening": screening,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    display::print_compliance(&result);
    if let Some(report) = &screening {
        display::print_screening(report);
    }
    Ok(())
}

fn cmd_regulations(
    registry: &RegulationRegistry,
    region: Option<Region>,
    search: Option<&str>,
    verified_only: bool,
) {
    let regs: Vec<&Regulation> = match search {
        Some(k) => registry.search(k),
        None => registry.iter().collect(),
    };
    let regs: Vec<&Regulation> = regs
        .into_iter()
        .filter(|r| region.is_none_or(|wanted| r.region == wanted))
        .filter(|r| !verified_only || r.verified)
        .collect();
    display::print_regulations(&regs);
}

fn write_ipc(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = FileWriter::try_new(file, &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    tracing::info!(rows = batch.num_rows(), path = %path.display(), "wrote arrow file");
    Ok(())
}
