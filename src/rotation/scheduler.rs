//! Rotation scheduler - due checks and read-only previews

use crate::core::config::RotationConfig;
use crate::core::types::Tick;
use crate::rotation::facility::Facility;
use crate::rotation::schedule::VirtualSchedule;

/// Decides when a facility's stock is due and which tick a preview reflects
#[derive(Debug, Clone, Copy)]
pub struct RotationScheduler {
    config: RotationConfig,
    schedule: VirtualSchedule,
}

impl RotationScheduler {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            config,
            schedule: VirtualSchedule::new(config),
        }
    }

    pub fn config(&self) -> RotationConfig {
        self.config
    }

    pub fn schedule(&self) -> &VirtualSchedule {
        &self.schedule
    }

    /// True iff the facility has a real stamp at least one interval old
    ///
    /// Unvisited facilities are never "due": their first visit goes through
    /// first-time alignment instead. A stamp ahead of `now` is a clock
    /// regression and reads as not due.
    pub fn is_rotation_due(&self, facility: &Facility, now: Tick) -> bool {
        let Some(stamp) = facility.rotation_timestamp else {
            return false;
        };
        match now.checked_sub(stamp) {
            Some(elapsed) => elapsed >= self.schedule.interval_ticks(),
            None => {
                tracing::warn!(
                    "Clock regression for facility {}: now {} < stamp {}",
                    facility.id(),
                    now,
                    stamp
                );
                false
            }
        }
    }

    /// Tick whose variant the facility currently shows
    ///
    /// Never mutates the facility.
    pub fn preview_tick(&self, facility: &Facility, now: Tick) -> Tick {
        match facility.rotation_timestamp {
            Some(stamp) => stamp,
            None => self.schedule.expected_boundary(facility.id(), now),
        }
    }

    /// Tick at which the currently shown stock stops being current
    pub fn next_rotation_tick(&self, facility: &Facility, now: Tick) -> Tick {
        match facility.rotation_timestamp {
            Some(stamp) => stamp.saturating_add(self.schedule.interval_ticks()),
            None => self.schedule.next_boundary_after(facility.id(), now),
        }
    }

    /// Ticks left before the next rotation, zero when already due
    pub fn ticks_until_rotation(&self, facility: &Facility, now: Tick) -> Tick {
        self.next_rotation_tick(facility, now).saturating_sub(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FacilityId;

    fn scheduler() -> RotationScheduler {
        RotationScheduler::new(RotationConfig {
            interval_ticks: 1000,
        })
    }

    #[test]
    fn test_never_generated_is_not_due() {
        let s = scheduler();
        let facility = Facility::new(FacilityId(7));
        assert!(!s.is_rotation_due(&facility, 0));
        assert!(!s.is_rotation_due(&facility, 1_000_000));
    }

    #[test]
    fn test_due_after_full_interval() {
        let s = scheduler();
        let facility = Facility::restore(FacilityId(7), Some(1801));
        assert!(!s.is_rotation_due(&facility, 1801));
        assert!(!s.is_rotation_due(&facility, 2800));
        assert!(s.is_rotation_due(&facility, 2801));
        assert!(s.is_rotation_due(&facility, 9000));
    }

    #[test]
    fn test_clock_regression_is_not_due() {
        let s = scheduler();
        let facility = Facility::restore(FacilityId(7), Some(5000));
        assert!(!s.is_rotation_due(&facility, 100));
        assert_eq!(s.ticks_until_rotation(&facility, 100), 5900);
    }

    #[test]
    fn test_preview_tick_unvisited_uses_virtual_boundary() {
        let s = scheduler();
        let facility = Facility::new(FacilityId(7));
        assert_eq!(s.preview_tick(&facility, 2300), 1801);
        assert_eq!(s.preview_tick(&facility, 2300), 1801);
        assert!(facility.is_never_generated(), "Preview must not mutate the facility");
    }

    #[test]
    fn test_preview_tick_visited_uses_stamp() {
        let s = scheduler();
        let facility = Facility::restore(FacilityId(7), Some(4242));
        assert_eq!(s.preview_tick(&facility, 9999), 4242);
    }

    #[test]
    fn test_next_rotation_tick() {
        let s = scheduler();
        let unvisited = Facility::new(FacilityId(7));
        assert_eq!(s.next_rotation_tick(&unvisited, 2300), 2801);
        assert_eq!(s.ticks_until_rotation(&unvisited, 2300), 501);

        let visited = Facility::restore(FacilityId(7), Some(1801));
        assert_eq!(s.next_rotation_tick(&visited, 2300), 2801);
        assert_eq!(s.ticks_until_rotation(&visited, 3500), 0);
    }
}
