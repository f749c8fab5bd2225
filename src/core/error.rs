use thiserror::Error;

use crate::core::types::FacilityId;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("No selectable variant for facility {facility:?}")]
    EmptyCatalog { facility: Option<FacilityId> },

    #[error("Facility {0} is already regenerating")]
    AlreadyRegenerating(FacilityId),

    #[error("Facility {0} has no active regeneration span")]
    NotRegenerating(FacilityId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog error: {0}")]
    CatalogLoad(String),

    #[error("Facility ids exhausted")]
    IdsExhausted,

    #[error("Corrupt save: {0}")]
    CorruptSave(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RotationError>;
