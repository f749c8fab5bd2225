//! Facility Rotation - Market Shell
//!
//! Interactive shell over a small market of facilities. Advance time, preview
//! stock of shops you have never entered, and visit them to see the preview
//! honored on first entry and rotated on schedule afterwards.

use facility_rotation::catalog::{SelectionContext, StockVariant, VariantCatalog};
use facility_rotation::core::error::Result;
use facility_rotation::core::{Clock, FacilityId, ManualClock, RotationConfig};
use facility_rotation::persistence::{FacilityRegistry, JsonFileStore, PersistenceStore};
use facility_rotation::rotation::RegenerationCoordinator;

use ahash::AHashMap;
use std::io::{self, Write};
use std::path::Path;

const SAVE_PATH: &str = "market_save.json";
const TICKS_PER_DAY: u64 = 1000;

/// Everything the shell owns
struct Market {
    clock: ManualClock,
    registry: FacilityRegistry,
    coordinator: RegenerationCoordinator<StockVariant>,
    context: SelectionContext,
    /// Materialized shelves, keyed by facility (the content layer's side)
    shelves: AHashMap<FacilityId, String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facility_rotation=info".into()),
        )
        .init();

    tracing::info!("Market shell starting...");

    let config = load_config()?;
    let catalog = load_catalog()?;
    let mut store = JsonFileStore::new(SAVE_PATH);
    let mut registry = store.load()?;
    if registry.is_empty() {
        spawn_initial_market(&mut registry)?;
    }

    let mut market = Market {
        clock: ManualClock::new(),
        registry,
        coordinator: RegenerationCoordinator::new(config, catalog),
        context: SelectionContext::default(),
        shelves: AHashMap::new(),
    };

    println!("\n=== MARKET SHELL ===");
    println!("Rotation interval: {} ticks", config.interval_ticks);
    println!();
    println!("Commands:");
    println!("  tick [n] / t    - Advance time by n ticks (default 1)");
    println!("  day             - Advance time by one day ({} ticks)", TICKS_PER_DAY);
    println!("  visit <id>      - Enter a facility (regenerates if due)");
    println!("  preview / p     - Show what every facility currently offers");
    println!("  status / s      - Show rotation stamps and timers");
    println!("  spawn           - Open a new facility");
    println!("  pop <n>         - Set settlement population");
    println!("  save            - Save facilities to {}", SAVE_PATH);
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("[tick {}] > ", market.clock.now());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        if input == "tick" || input == "t" {
            market.clock.advance();
            continue;
        }

        if let Some(arg) = input.strip_prefix("tick ") {
            match arg.trim().parse::<u64>() {
                Ok(n) => market.clock.advance_by(n),
                Err(_) => println!("Usage: tick <number>"),
            }
            continue;
        }

        if input == "day" {
            market.clock.advance_by(TICKS_PER_DAY);
            continue;
        }

        if input == "preview" || input == "p" {
            display_preview(&market);
            continue;
        }

        if input == "status" || input == "s" {
            display_status(&market);
            continue;
        }

        if input == "spawn" {
            match market.registry.spawn() {
                Ok(id) => println!("Opened facility {}", id),
                Err(e) => println!("Cannot open a facility: {}", e),
            }
            continue;
        }

        if input == "save" {
            store.save(&market.registry)?;
            println!("Saved {} facilities.", market.registry.len());
            continue;
        }

        if let Some(arg) = input.strip_prefix("pop ") {
            match arg.trim().parse::<f64>() {
                Ok(n) if n >= 0.0 => market.context = SelectionContext::new(n),
                _ => println!("Usage: pop <non-negative number>"),
            }
            continue;
        }

        if let Some(arg) = input.strip_prefix("visit ") {
            match arg.trim().parse::<u64>() {
                Ok(raw) => {
                    if let Err(e) = visit(&mut market, FacilityId(raw)) {
                        println!("Visit failed: {}", e);
                    }
                }
                Err(_) => println!("Usage: visit <id>"),
            }
            continue;
        }

        println!("Unknown command. Available: tick, day, visit <id>, preview, status, spawn, pop <n>, save, quit");
    }

    println!(
        "\nGoodbye! {} facilities, {} ticks elapsed.",
        market.registry.len(),
        market.clock.now()
    );
    Ok(())
}

fn load_config() -> Result<RotationConfig> {
    let path = Path::new("data/rotation.toml");
    if path.exists() {
        RotationConfig::load_from_toml(path)
    } else {
        tracing::warn!("{} not found - using default rotation config", path.display());
        Ok(RotationConfig::default())
    }
}

fn load_catalog() -> Result<VariantCatalog<StockVariant>> {
    let path = Path::new("data/stock_variants.toml");
    if path.exists() {
        VariantCatalog::load_from_toml(path)
    } else {
        tracing::warn!("{} not found - using built-in stock list", path.display());
        Ok(VariantCatalog::with_defaults())
    }
}

fn spawn_initial_market(registry: &mut FacilityRegistry) -> Result<()> {
    for _ in 0..5 {
        registry.spawn()?;
    }
    tracing::info!("Opened {} initial facilities", registry.len());
    Ok(())
}

/// Enter a facility, restocking it first if its rotation is due
fn visit(market: &mut Market, id: FacilityId) -> Result<()> {
    let now = market.clock.now();
    let Some(facility) = market.registry.get_mut(id) else {
        println!("No facility {}", id);
        return Ok(());
    };

    let context = market.context;
    let restocked = market
        .coordinator
        .regenerate_if_due(facility, now, |span| {
            let variant = span.query(&context)?.clone();
            span.stamp();
            Ok(variant)
        })?;

    if let Some(variant) = restocked {
        market.shelves.insert(id, variant.name.clone());
        println!("{} restocked with {} ({})", id, variant.name, variant.id);
    }

    match market.shelves.get(&id) {
        Some(stock) => println!("{} offers: {}", id, stock),
        None => {
            // Loaded from a save: shelves are rebuilt from the committed stamp
            let variant = market
                .coordinator
                .query_outside_regeneration(facility, now, &context)?;
            market.shelves.insert(id, variant.name.clone());
            println!("{} offers: {}", id, variant.name);
        }
    }
    Ok(())
}

fn display_preview(market: &Market) {
    let now = market.clock.now();
    println!();
    for facility in market.registry.iter() {
        let label = if facility.is_never_generated() {
            "unvisited"
        } else {
            "visited"
        };
        match market
            .coordinator
            .query_outside_regeneration(facility, now, &market.context)
        {
            Ok(variant) => println!("  {} ({}): {}", facility.id(), label, variant.name),
            Err(e) => println!("  {} ({}): no stock - {}", facility.id(), label, e),
        }
    }
    println!();
}

fn display_status(market: &Market) {
    let now = market.clock.now();
    let scheduler = market.coordinator.scheduler();
    println!();
    println!(
        "Tick {} | population {:.0} | {} facilities",
        now,
        market.context.population,
        market.registry.len()
    );
    for facility in market.registry.iter() {
        let stamp = match facility.rotation_timestamp {
            Some(tick) => tick.to_string(),
            None => "never".to_string(),
        };
        println!(
            "  {}: stamp {}, shows tick {}, next rotation in {} ticks (phase {})",
            facility.id(),
            stamp,
            scheduler.preview_tick(facility, now),
            scheduler.ticks_until_rotation(facility, now),
            scheduler.schedule().desync_offset(facility.id())
        );
    }
    println!();
}
