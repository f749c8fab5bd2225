//! Facility - the long-lived owner of a rotating stock assignment

use serde::{Deserialize, Serialize};

use crate::core::types::{FacilityId, Tick};

/// Stored timestamp of a facility that has never committed a regeneration
pub const NEVER_GENERATED: Option<Tick> = None;

/// A facility with a stable identity and one persisted rotation stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    id: FacilityId,
    /// Tick of the last committed regeneration, `None` until first visit
    pub rotation_timestamp: Option<Tick>,
}

impl Facility {
    /// A facility that has never been materially generated
    pub fn new(id: FacilityId) -> Self {
        Self {
            id,
            rotation_timestamp: NEVER_GENERATED,
        }
    }

    /// Rebuild a facility from persisted state
    pub fn restore(id: FacilityId, rotation_timestamp: Option<Tick>) -> Self {
        Self {
            id,
            rotation_timestamp,
        }
    }

    pub fn id(&self) -> FacilityId {
        self.id
    }

    pub fn is_never_generated(&self) -> bool {
        self.rotation_timestamp.is_none()
    }

    /// Write the regeneration stamp.
    ///
    /// This is the single write the content layer's regenerate operation
    /// performs; the coordinator may override it on commit.
    pub fn stamp(&mut self, now: Tick) {
        self.rotation_timestamp = Some(now);
    }
}
