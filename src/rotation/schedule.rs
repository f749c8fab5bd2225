//! Virtual rotation schedule
//!
//! Answers "when would this facility have last rotated?" purely from its
//! identity and the current tick. Nothing here reads or writes facility
//! state, so it is safe to call from preview code at any time.

use crate::core::config::RotationConfig;
use crate::core::types::{FacilityId, Tick};

/// Prime used to spread facility phases across the interval
///
/// Sequential ids multiplied by a large prime land far apart modulo any
/// interval in the configured range, so neighbouring facilities do not
/// restock on the same tick.
pub const DESYNC_PRIME: u64 = 123_457;

/// Earliest boundary ever reported, used when `now` precedes the first
/// aligned boundary of a facility
pub const BOUNDARY_FLOOR: Tick = 0;

/// Pure calculator for per-facility virtual rotation boundaries
#[derive(Debug, Clone, Copy)]
pub struct VirtualSchedule {
    interval_ticks: Tick,
}

impl VirtualSchedule {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            interval_ticks: config.interval_ticks.max(1),
        }
    }

    pub fn interval_ticks(&self) -> Tick {
        self.interval_ticks
    }

    /// Per-facility phase shift in `0..interval_ticks`
    pub fn desync_offset(&self, id: FacilityId) -> Tick {
        let product = id.raw() as u128 * DESYNC_PRIME as u128;
        (product % self.interval_ticks as u128) as Tick
    }

    /// Distance from the most recent aligned boundary to `now`
    fn phase(&self, id: FacilityId, now: Tick) -> Tick {
        (now % self.interval_ticks + self.desync_offset(id)) % self.interval_ticks
    }

    /// Latest tick `b <= now` with `(b + offset) % interval == 0`
    ///
    /// Clamped to [`BOUNDARY_FLOOR`] when the facility has not reached its
    /// first aligned boundary yet.
    pub fn expected_boundary(&self, id: FacilityId, now: Tick) -> Tick {
        now.checked_sub(self.phase(id, now)).unwrap_or(BOUNDARY_FLOOR)
    }

    /// Earliest aligned boundary strictly after `tick`
    pub fn next_boundary_after(&self, id: FacilityId, tick: Tick) -> Tick {
        tick.saturating_add(self.interval_ticks - self.phase(id, tick))
    }
}
