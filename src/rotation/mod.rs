//! Rotation layer - schedules, selection, and regeneration coordination

pub mod coordinator;
pub mod facility;
pub mod schedule;
pub mod scheduler;
pub mod selector;

pub use coordinator::{CoordinationState, RegenerationCoordinator, RegenerationSpan};
pub use facility::{Facility, NEVER_GENERATED};
pub use schedule::{VirtualSchedule, DESYNC_PRIME};
pub use scheduler::RotationScheduler;
pub use selector::{rotation_seed, select_variant, weighted_roll, Variant};
