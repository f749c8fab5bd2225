//! Integration tests across sessions
//!
//! A session loads its rotation config and catalog from data/, plays, saves
//! the registry, and a later session must show the same shelves.

use std::path::Path;

use facility_rotation::catalog::{SelectionContext, StockVariant, VariantCatalog};
use facility_rotation::core::config::DEFAULT_INTERVAL_TICKS;
use facility_rotation::core::{FacilityId, RotationConfig};
use facility_rotation::persistence::{
    FacilityRegistry, JsonFileStore, MemoryStore, PersistenceStore,
};
use facility_rotation::rotation::RegenerationCoordinator;

fn new_session() -> RegenerationCoordinator<StockVariant> {
    let config = RotationConfig::load_from_toml(Path::new("data/rotation.toml"))
        .expect("Should load data/rotation.toml");
    let catalog = VariantCatalog::load_from_toml(Path::new("data/stock_variants.toml"))
        .expect("Should load data/stock_variants.toml");
    RegenerationCoordinator::new(config, catalog)
}

#[test]
fn test_data_files_load() {
    let config = RotationConfig::load_from_toml(Path::new("data/rotation.toml")).unwrap();
    assert_eq!(config.interval_ticks, DEFAULT_INTERVAL_TICKS);

    let catalog = VariantCatalog::load_from_toml(Path::new("data/stock_variants.toml")).unwrap();
    assert_eq!(catalog.len(), 5);
    assert!(catalog.get("preserves").is_some());
}

#[test]
fn test_missing_config_file_is_io_error() {
    let result = RotationConfig::load_from_toml(Path::new("data/does_not_exist.toml"));
    assert!(matches!(
        result,
        Err(facility_rotation::core::RotationError::Io(_))
    ));
}

#[test]
fn test_shelves_survive_save_and_load() {
    let ctx = SelectionContext::new(300.0);
    let mut store = MemoryStore::new();

    // Session one: visit two of three facilities
    let mut coord = new_session();
    let mut registry = FacilityRegistry::new();
    let ids: Vec<FacilityId> = (0..3).map(|_| registry.spawn().unwrap()).collect();

    let mut stocked = Vec::new();
    for &id in &ids[..2] {
        let facility = registry.get_mut(id).unwrap();
        let chosen = coord
            .regenerate(facility, 20_000, |span| {
                let v = span.query(&ctx)?.id.clone();
                span.stamp();
                Ok(v)
            })
            .unwrap();
        stocked.push((id, chosen));
    }
    let unvisited_preview = coord
        .query_outside_regeneration(registry.get(ids[2]).unwrap(), 20_500, &ctx)
        .unwrap()
        .id
        .clone();
    store.save(&registry).unwrap();

    // Session two: fresh coordinator, loaded registry
    let coord = new_session();
    let registry = store.load().unwrap();

    for (id, chosen) in &stocked {
        let facility = registry.get(*id).unwrap();
        let shown = coord
            .query_outside_regeneration(facility, 20_500, &ctx)
            .unwrap();
        assert_eq!(&shown.id, chosen, "Facility {} changed stock across sessions", id);
    }

    let facility = registry.get(ids[2]).unwrap();
    assert!(facility.is_never_generated());
    assert_eq!(
        coord
            .query_outside_regeneration(facility, 20_500, &ctx)
            .unwrap()
            .id,
        unvisited_preview
    );
}

#[test]
fn test_json_store_session_round_trip() {
    let path = std::env::temp_dir().join(format!(
        "facility_rotation_session_{}.json",
        std::process::id()
    ));
    let ctx = SelectionContext::default();

    let mut coord = new_session();
    let mut registry = FacilityRegistry::new();
    let id = registry.spawn().unwrap();
    let chosen = coord
        .regenerate(registry.get_mut(id).unwrap(), 9_000, |span| {
            let v = span.query(&ctx)?.id.clone();
            span.stamp();
            Ok(v)
        })
        .unwrap();

    let mut store = JsonFileStore::new(&path);
    store.save(&registry).unwrap();
    let loaded = store.load().unwrap();
    let _ = std::fs::remove_file(&path);

    let coord = new_session();
    let facility = loaded.get(id).unwrap();
    assert_eq!(
        facility.rotation_timestamp,
        registry.get(id).unwrap().rotation_timestamp
    );
    assert_eq!(
        coord
            .query_outside_regeneration(facility, 9_500, &ctx)
            .unwrap()
            .id,
        chosen
    );
}
