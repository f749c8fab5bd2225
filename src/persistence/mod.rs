//! Persistence layer - facility registry and save stores

pub mod registry;
pub mod store;

pub use registry::FacilityRegistry;
pub use store::{JsonFileStore, MemoryStore, PersistenceStore};
