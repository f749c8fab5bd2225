//! Headless Rotation Runner
//!
//! Drives a market of facilities through many ticks with a seeded visitor,
//! checking on every regeneration that the restocked variant is the one the
//! preview showed an instant earlier. Exits non-zero on any mismatch.

use facility_rotation::catalog::{SelectionContext, StockVariant, VariantCatalog};
use facility_rotation::core::{Clock, FacilityId, ManualClock, RotationConfig};
use facility_rotation::persistence::FacilityRegistry;
use facility_rotation::rotation::RegenerationCoordinator;

use ahash::AHashMap;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

/// Headless rotation runner - seeded visits with preview consistency checks
#[derive(Parser, Debug)]
#[command(name = "rotation_sim")]
#[command(about = "Simulate facility visits and verify preview/regeneration consistency")]
struct Args {
    /// Number of facilities in the market
    #[arg(long, default_value_t = 20)]
    facilities: u32,

    /// Ticks to simulate
    #[arg(long, default_value_t = 50_000)]
    ticks: u64,

    /// Ticks between visitor steps
    #[arg(long, default_value_t = 250)]
    step: u64,

    /// Rotation interval override (ticks)
    #[arg(long)]
    interval: Option<u64>,

    /// Rotation config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stock variant catalog (TOML)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Settlement population used for weighting
    #[arg(long, default_value_t = 200.0)]
    population: f64,

    /// Random seed for the visitor
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize, Default)]
struct RunReport {
    ticks: u64,
    visits: u32,
    first_visits: u32,
    rotations: u32,
    mismatches: u32,
    variant_counts: AHashMap<String, u32>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facility_rotation=warn".into()),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(report) => {
            if args.format == "json" {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Failed to serialize report: {}", e),
                }
            } else {
                print_text_report(&report);
            }
            if report.mismatches > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Run failed: {}", e);
            std::process::exit(2);
        }
    }
}

fn run(args: &Args) -> facility_rotation::core::Result<RunReport> {
    let mut config = match &args.config {
        Some(path) => RotationConfig::load_from_toml(path)?,
        None => RotationConfig::default(),
    };
    if let Some(interval) = args.interval {
        config = RotationConfig::new(interval)?;
    }
    let catalog = match &args.catalog {
        Some(path) => VariantCatalog::load_from_toml(path)?,
        None => VariantCatalog::with_defaults(),
    };

    let mut registry = FacilityRegistry::new();
    for _ in 0..args.facilities {
        registry.spawn()?;
    }
    let ids = registry.ids();

    let mut coordinator: RegenerationCoordinator<StockVariant> =
        RegenerationCoordinator::new(config, catalog);
    let context = SelectionContext::new(args.population);
    let mut clock = ManualClock::new();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut report = RunReport::default();

    tracing::info!(
        "Simulating {} facilities for {} ticks (interval {})",
        ids.len(),
        args.ticks,
        config.interval_ticks
    );

    while clock.now() < args.ticks && !ids.is_empty() {
        clock.advance_by(args.step.max(1));
        let now = clock.now();

        let id: FacilityId = ids[rng.gen_range(0..ids.len())];
        let Some(facility) = registry.get_mut(id) else {
            continue;
        };

        let was_new = facility.is_never_generated();
        let preview = coordinator
            .query_outside_regeneration(facility, now, &context)?
            .id
            .clone();

        let restocked = coordinator.regenerate_if_due(facility, now, |span| {
            let variant = span.query(&context)?.id.clone();
            span.stamp();
            Ok(variant)
        })?;

        report.visits += 1;
        let Some(variant) = restocked else {
            continue;
        };

        if was_new {
            report.first_visits += 1;
            if variant != preview {
                report.mismatches += 1;
                tracing::error!(
                    "Facility {} first visit chose {} but preview showed {}",
                    id,
                    variant,
                    preview
                );
            }
        } else {
            report.rotations += 1;
        }

        // Whatever was chosen must be what the facility previews from now on
        let after = coordinator
            .query_outside_regeneration(facility, now, &context)?
            .id
            .clone();
        if after != variant {
            report.mismatches += 1;
            tracing::error!(
                "Facility {} regenerated {} but now previews {}",
                id,
                variant,
                after
            );
        }

        *report.variant_counts.entry(variant).or_insert(0) += 1;
    }

    report.ticks = clock.now();
    Ok(report)
}

fn print_text_report(report: &RunReport) {
    println!("=== ROTATION RUN ===");
    println!("Ticks simulated: {}", report.ticks);
    println!(
        "Visits: {} ({} first visits, {} rotations)",
        report.visits, report.first_visits, report.rotations
    );
    println!("Mismatches: {}", report.mismatches);
    println!("Variants stocked:");
    let mut counts: Vec<_> = report.variant_counts.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (variant, count) in counts {
        println!("  {}: {}", variant, count);
    }
}
