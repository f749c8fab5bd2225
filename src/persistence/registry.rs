//! Facility registry - owns facilities and hands out identities

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RotationError};
use crate::core::types::FacilityId;
use crate::rotation::facility::Facility;

/// All facilities of a save, plus the id allocator
///
/// `next_id` only ever grows, so an id freed by `remove` is never handed
/// out again, even across save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityRegistry {
    next_id: u64,
    facilities: Vec<Facility>,
}

impl FacilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a never-generated facility with a fresh id
    pub fn spawn(&mut self) -> Result<FacilityId> {
        let id = FacilityId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(RotationError::IdsExhausted)?;
        self.facilities.push(Facility::new(id));
        Ok(id)
    }

    /// Insert a facility loaded from elsewhere, keeping ids unique
    ///
    /// Returns false if the id is already present.
    pub fn adopt(&mut self, facility: Facility) -> Result<bool> {
        match self.index_of(facility.id()) {
            Ok(_) => Ok(false),
            Err(idx) => {
                let after = facility
                    .id()
                    .raw()
                    .checked_add(1)
                    .ok_or(RotationError::IdsExhausted)?;
                self.next_id = self.next_id.max(after);
                self.facilities.insert(idx, facility);
                Ok(true)
            }
        }
    }

    /// Re-establish the registry invariants after deserializing
    ///
    /// Sorts facilities by id, refuses duplicate ids, and moves the
    /// allocator past the highest id so no id is handed out twice.
    pub fn into_consistent(mut self) -> Result<Self> {
        self.facilities.sort_by_key(|f| f.id());
        if let Some(pair) = self.facilities.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(RotationError::CorruptSave(format!(
                "facility {} appears twice",
                pair[0].id()
            )));
        }
        if let Some(last) = self.facilities.last() {
            let after = last
                .id()
                .raw()
                .checked_add(1)
                .ok_or(RotationError::IdsExhausted)?;
            if self.next_id < after {
                tracing::warn!(
                    "Save allocator {} behind facility {}, advancing",
                    self.next_id,
                    last.id()
                );
                self.next_id = after;
            }
        }
        Ok(self)
    }

    pub fn remove(&mut self, id: FacilityId) -> Option<Facility> {
        let idx = self.index_of(id).ok()?;
        Some(self.facilities.remove(idx))
    }

    pub fn get(&self, id: FacilityId) -> Option<&Facility> {
        let idx = self.index_of(id).ok()?;
        self.facilities.get(idx)
    }

    pub fn get_mut(&mut self, id: FacilityId) -> Option<&mut Facility> {
        let idx = self.index_of(id).ok()?;
        self.facilities.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.iter()
    }

    pub fn ids(&self) -> Vec<FacilityId> {
        self.facilities.iter().map(|f| f.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn next_id(&self) -> FacilityId {
        FacilityId(self.next_id)
    }

    // Facilities stay sorted by id: spawn appends increasing ids, adopt inserts in place
    fn index_of(&self, id: FacilityId) -> std::result::Result<usize, usize> {
        self.facilities.binary_search_by_key(&id, |f| f.id())
    }
}
