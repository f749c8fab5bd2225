//! Clock adapter
//!
//! The host owns time. Core operations take `now` as a plain value; this
//! trait only exists so hosts and binaries can hand over whatever counter
//! they already advance.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

/// A monotonically non-decreasing tick source
pub trait Clock {
    fn now(&self) -> Tick;
}

/// Host-driven tick counter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualClock {
    tick: Tick,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(tick: Tick) -> Self {
        Self { tick }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    pub fn advance_by(&mut self, ticks: Tick) {
        self.tick = self.tick.saturating_add(ticks);
    }

    /// Jump to an absolute tick. Refuses to go backwards.
    ///
    /// Returns false (and leaves the clock untouched) on regression.
    pub fn set(&mut self, tick: Tick) -> bool {
        if tick < self.tick {
            return false;
        }
        self.tick = tick;
        true
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.tick
    }
}
