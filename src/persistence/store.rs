//! Save stores for the facility registry
//!
//! Only identities and committed rotation stamps are persisted. Span state
//! lives in the coordinator and never reaches a save.

use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::persistence::registry::FacilityRegistry;

/// Loads and saves facility ids and rotation stamps
pub trait PersistenceStore {
    fn load(&self) -> Result<FacilityRegistry>;
    fn save(&mut self, registry: &FacilityRegistry) -> Result<()>;
}

/// In-memory store, mainly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<FacilityRegistry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self) -> Result<FacilityRegistry> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, registry: &FacilityRegistry) -> Result<()> {
        self.saved = Some(registry.clone());
        Ok(())
    }
}

/// JSON file store
///
/// A missing file loads as an empty registry.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceStore for JsonFileStore {
    fn load(&self) -> Result<FacilityRegistry> {
        if !self.path.exists() {
            tracing::debug!("No save at {}, starting fresh", self.path.display());
            return Ok(FacilityRegistry::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let registry: FacilityRegistry = serde_json::from_str(&content)?;
        let registry = registry.into_consistent()?;
        tracing::debug!(
            "Loaded {} facilities from {}",
            registry.len(),
            self.path.display()
        );
        Ok(registry)
    }

    fn save(&mut self, registry: &FacilityRegistry) -> Result<()> {
        let json = serde_json::to_string_pretty(registry)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(
            "Saved {} facilities to {}",
            registry.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RotationError;
    use crate::core::types::FacilityId;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("facility_rotation_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let mut registry = FacilityRegistry::new();
        let id = registry.spawn().unwrap();
        registry.get_mut(id).unwrap().stamp(1801);
        store.save(&registry).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_json_store_persists_stamps_and_allocator() {
        let path = temp_path("persist");
        let mut store = JsonFileStore::new(&path);

        let mut registry = FacilityRegistry::new();
        let visited = registry.spawn().unwrap();
        let _unvisited = registry.spawn().unwrap();
        registry.get_mut(visited).unwrap().stamp(1801);
        store.save(&registry).unwrap();

        let mut loaded = store.load().unwrap();
        assert_eq!(loaded.get(visited).unwrap().rotation_timestamp, Some(1801));
        assert!(loaded.get(FacilityId(1)).unwrap().is_never_generated());
        assert_eq!(loaded.spawn().unwrap(), FacilityId(2));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(RotationError::Serde(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_repairs_hand_edited_allocator() {
        let path = temp_path("edited");
        std::fs::write(
            &path,
            r#"{
                "next_id": 1,
                "facilities": [
                    { "id": 5, "rotation_timestamp": 1801 },
                    { "id": 2, "rotation_timestamp": null }
                ]
            }"#,
        )
        .unwrap();

        let mut loaded = JsonFileStore::new(&path).load().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.ids(), vec![FacilityId(2), FacilityId(5)]);
        assert_eq!(loaded.spawn().unwrap(), FacilityId(6));
    }
}
