//! Rotation configuration with documented bounds
//!
//! The rotation interval is operator-configurable between sessions but fixed
//! for the lifetime of a session. Everything that depends on it (scheduler,
//! coordinator) takes a copy at construction.

use serde::Deserialize;

use crate::core::error::{Result, RotationError};
use crate::core::types::Tick;

/// Shortest allowed rotation period
///
/// Below this, facilities would restock faster than a player can walk
/// between two of them.
pub const MIN_INTERVAL_TICKS: Tick = 100;

/// Longest allowed rotation period
pub const MAX_INTERVAL_TICKS: Tick = 100_000;

/// Default rotation period (six in-game days at 1000 ticks per day)
pub const DEFAULT_INTERVAL_TICKS: Tick = 6_000;

/// Configuration for the rotation schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotation period in ticks
    ///
    /// Also the modulus of the per-facility desync offset, so changing it
    /// between sessions reshuffles every facility's phase.
    pub interval_ticks: Tick,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_ticks: DEFAULT_INTERVAL_TICKS,
        }
    }
}

impl RotationConfig {
    /// Create a validated config
    pub fn new(interval_ticks: Tick) -> Result<Self> {
        let config = Self { interval_ticks };
        config.validate()?;
        Ok(config)
    }

    /// Validate that the interval lies within the documented bounds
    pub fn validate(&self) -> Result<()> {
        if !(MIN_INTERVAL_TICKS..=MAX_INTERVAL_TICKS).contains(&self.interval_ticks) {
            return Err(RotationError::InvalidConfig(format!(
                "interval_ticks ({}) must be within {}..={}",
                self.interval_ticks, MIN_INTERVAL_TICKS, MAX_INTERVAL_TICKS
            )));
        }
        Ok(())
    }

    /// Load config from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse config from a TOML string
    ///
    /// A missing `[rotation]` table or key falls back to the default.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: TomlConfigFile = toml::from_str(content)?;
        let interval_ticks = file
            .rotation
            .and_then(|r| r.interval_ticks)
            .unwrap_or(DEFAULT_INTERVAL_TICKS);
        Self::new(interval_ticks)
    }
}

/// TOML representation of the config file
#[derive(Debug, Deserialize)]
struct TomlConfigFile {
    rotation: Option<TomlRotation>,
}

#[derive(Debug, Deserialize)]
struct TomlRotation {
    interval_ticks: Option<Tick>,
}
