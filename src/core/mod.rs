pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock};
pub use config::RotationConfig;
pub use error::{Result, RotationError};
pub use types::{FacilityId, Tick};
