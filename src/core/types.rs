//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter (abstract, monotonic time unit)
pub type Tick = u64;

/// Process-unique facility identity, assigned once and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacilityId(pub u64);

impl FacilityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FacilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_id_equality() {
        let a = FacilityId(1);
        let b = FacilityId(1);
        let c = FacilityId(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_facility_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<FacilityId, &str> = HashMap::new();
        map.insert(FacilityId(7), "general store");
        assert_eq!(map.get(&FacilityId(7)), Some(&"general store"));
    }

    #[test]
    fn test_facility_id_display() {
        assert_eq!(FacilityId::new(42).to_string(), "#42");
        assert_eq!(FacilityId::new(42).raw(), 42);
    }
}
