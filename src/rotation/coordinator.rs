//! Regeneration coordinator
//!
//! Brackets the content layer's opaque regenerate operation so that every
//! variant query made inside it agrees with the query made afterwards, and
//! so that a facility's first regeneration reproduces the variant its
//! preview showed.
//!
//! Per-facility state machine:
//!
//! ```text
//! Idle --begin(never generated)--> FirstTimeAligning --commit--> Idle
//! Idle --begin(generated)--------> Rotating ----------commit--> Idle
//! ```
//!
//! Idle facilities have no entry in the state map.

use ahash::AHashMap;

use crate::catalog::VariantCatalog;
use crate::core::clock::Clock;
use crate::core::config::RotationConfig;
use crate::core::error::{Result, RotationError};
use crate::core::types::{FacilityId, Tick};
use crate::rotation::facility::Facility;
use crate::rotation::scheduler::RotationScheduler;
use crate::rotation::selector::{rotation_seed, select_variant, Variant};

/// Active span state for one facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationState {
    /// First visit: the stored stamp was pre-seeded with the virtual boundary
    FirstTimeAligning { saved: Tick },
    /// Normal rotation: `saved` is the stale stamp from the previous rotation
    Rotating { saved: Tick },
}

impl CoordinationState {
    pub fn saved(&self) -> Tick {
        match self {
            Self::FirstTimeAligning { saved } | Self::Rotating { saved } => *saved,
        }
    }
}

/// Owns per-facility span state and the session's variant catalog
#[derive(Debug)]
pub struct RegenerationCoordinator<V> {
    scheduler: RotationScheduler,
    catalog: VariantCatalog<V>,
    states: AHashMap<FacilityId, CoordinationState>,
}

impl<V: Variant> RegenerationCoordinator<V> {
    pub fn new(config: RotationConfig, catalog: VariantCatalog<V>) -> Self {
        Self {
            scheduler: RotationScheduler::new(config),
            catalog,
            states: AHashMap::new(),
        }
    }

    pub fn scheduler(&self) -> &RotationScheduler {
        &self.scheduler
    }

    pub fn catalog(&self) -> &VariantCatalog<V> {
        &self.catalog
    }

    /// Current span state, `None` when idle
    pub fn state_of(&self, id: FacilityId) -> Option<CoordinationState> {
        self.states.get(&id).copied()
    }

    pub fn is_idle(&self, id: FacilityId) -> bool {
        !self.states.contains_key(&id)
    }

    /// Number of facilities currently inside a span
    pub fn active_spans(&self) -> usize {
        self.states.len()
    }

    /// Open a regeneration span for `facility`
    ///
    /// On a first visit this pre-seeds `rotation_timestamp` with the virtual
    /// boundary for `now`.
    pub fn begin(&mut self, facility: &mut Facility, now: Tick) -> Result<()> {
        let id = facility.id();
        if self.states.contains_key(&id) {
            return Err(RotationError::AlreadyRegenerating(id));
        }

        let state = match facility.rotation_timestamp {
            None => {
                let boundary = self.scheduler.schedule().expected_boundary(id, now);
                facility.rotation_timestamp = Some(boundary);
                tracing::debug!(
                    "Facility {} first visit at tick {}, aligning to boundary {}",
                    id,
                    now,
                    boundary
                );
                CoordinationState::FirstTimeAligning { saved: boundary }
            }
            Some(stamp) => {
                if now < stamp {
                    tracing::warn!(
                        "Clock regression for facility {}: now {} < stamp {}",
                        id,
                        now,
                        stamp
                    );
                }
                tracing::debug!("Facility {} rotating at tick {} (was {})", id, now, stamp);
                CoordinationState::Rotating { saved: stamp }
            }
        };

        self.states.insert(id, state);
        Ok(())
    }

    /// Tick a query inside the span resolves against
    ///
    /// Rotating spans use `now`, the value the regenerate operation is about
    /// to write, clamped to the saved stamp if the clock went backwards.
    /// Aligning spans use the pre-seeded boundary, which is what the preview
    /// showed.
    pub fn effective_tick_during(&self, facility: &Facility, now: Tick) -> Result<Tick> {
        match self.states.get(&facility.id()) {
            Some(CoordinationState::Rotating { saved }) => Ok(now.max(*saved)),
            Some(CoordinationState::FirstTimeAligning { saved }) => Ok(*saved),
            None => Err(RotationError::NotRegenerating(facility.id())),
        }
    }

    /// Variant query issued by the regenerate operation
    pub fn query_during_regeneration(
        &self,
        facility: &Facility,
        now: Tick,
        ctx: &V::Context,
    ) -> Result<&V> {
        let tick = self.effective_tick_during(facility, now)?;
        self.select_at(facility.id(), tick, ctx)
    }

    /// Close the span, restoring the aligned stamp on a first visit
    pub fn commit(&mut self, facility: &mut Facility) -> Result<()> {
        let id = facility.id();
        let state = self
            .states
            .remove(&id)
            .ok_or(RotationError::NotRegenerating(id))?;

        match state {
            CoordinationState::FirstTimeAligning { saved } => {
                facility.rotation_timestamp = Some(saved);
                tracing::info!("Facility {} generated, aligned to tick {}", id, saved);
            }
            CoordinationState::Rotating { saved } => {
                match facility.rotation_timestamp {
                    Some(written) if written < saved => {
                        tracing::warn!(
                            "Facility {} stamp {} behind saved {}, keeping saved",
                            id,
                            written,
                            saved
                        );
                        facility.rotation_timestamp = Some(saved);
                    }
                    None => facility.rotation_timestamp = Some(saved),
                    Some(written) if written == saved => {
                        tracing::debug!("Facility {} committed without a new stamp", id);
                    }
                    Some(_) => {}
                }
                tracing::info!(
                    "Facility {} rotated, stamp {:?}",
                    id,
                    facility.rotation_timestamp
                );
            }
        }
        Ok(())
    }

    /// Read-only variant query for preview code
    ///
    /// Never mutates the facility.
    pub fn query_outside_regeneration(
        &self,
        facility: &Facility,
        now: Tick,
        ctx: &V::Context,
    ) -> Result<&V> {
        if !self.is_idle(facility.id()) {
            tracing::debug!(
                "Preview query for facility {} while a span is open",
                facility.id()
            );
        }
        let tick = self.scheduler.preview_tick(facility, now);
        self.select_at(facility.id(), tick, ctx)
    }

    fn select_at(&self, id: FacilityId, tick: Tick, ctx: &V::Context) -> Result<&V> {
        let seed = rotation_seed(id, tick);
        select_variant(seed, self.catalog.as_slice(), ctx).map_err(|e| match e {
            RotationError::EmptyCatalog { .. } => {
                RotationError::EmptyCatalog { facility: Some(id) }
            }
            other => other,
        })
    }

    /// Open a scoped span; dropping it without `commit` still commits
    pub fn begin_span<'a>(
        &'a mut self,
        facility: &'a mut Facility,
        now: Tick,
    ) -> Result<RegenerationSpan<'a, V>> {
        self.begin(facility, now)?;
        Ok(RegenerationSpan {
            coordinator: self,
            facility,
            now,
            open: true,
        })
    }

    /// Run `op` inside a span and commit on every exit path
    ///
    /// Errors from `op` are returned after the span is closed.
    pub fn regenerate<T, F>(&mut self, facility: &mut Facility, now: Tick, op: F) -> Result<T>
    where
        F: FnOnce(&mut RegenerationSpan<'_, V>) -> Result<T>,
    {
        let mut span = self.begin_span(facility, now)?;
        let outcome = op(&mut span);
        span.commit()?;
        outcome
    }

    /// [`Self::regenerate`] reading `now` from a clock once
    pub fn regenerate_with_clock<T, F, C>(
        &mut self,
        facility: &mut Facility,
        clock: &C,
        op: F,
    ) -> Result<T>
    where
        C: Clock + ?Sized,
        F: FnOnce(&mut RegenerationSpan<'_, V>) -> Result<T>,
    {
        self.regenerate(facility, clock.now(), op)
    }

    /// Regenerate only on a first visit or when the rotation is due
    ///
    /// Returns `None` when the current stock is still valid.
    pub fn regenerate_if_due<T, F>(
        &mut self,
        facility: &mut Facility,
        now: Tick,
        op: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(&mut RegenerationSpan<'_, V>) -> Result<T>,
    {
        if !facility.is_never_generated() && !self.scheduler.is_rotation_due(facility, now) {
            return Ok(None);
        }
        self.regenerate(facility, now, op).map(Some)
    }
}

/// Scoped Begin→Commit span handed to the regenerate operation
pub struct RegenerationSpan<'a, V: Variant> {
    coordinator: &'a mut RegenerationCoordinator<V>,
    facility: &'a mut Facility,
    now: Tick,
    open: bool,
}

impl<'a, V: Variant> RegenerationSpan<'a, V> {
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn facility(&self) -> &Facility {
        &*self.facility
    }

    pub fn state(&self) -> Option<CoordinationState> {
        self.coordinator.state_of(self.facility.id())
    }

    /// Variant the regenerated stock should be built from
    pub fn query(&self, ctx: &V::Context) -> Result<&V> {
        self.coordinator
            .query_during_regeneration(&*self.facility, self.now, ctx)
    }

    /// The regenerate operation's own stamp write (`rotation_timestamp = now`)
    pub fn stamp(&mut self) {
        self.facility.stamp(self.now);
    }

    pub fn commit(mut self) -> Result<()> {
        self.open = false;
        self.coordinator.commit(&mut *self.facility)
    }
}

impl<'a, V: Variant> Drop for RegenerationSpan<'a, V> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        tracing::warn!(
            "Regeneration span for facility {} dropped without commit, closing it",
            self.facility.id()
        );
        if let Err(e) = self.coordinator.commit(&mut *self.facility) {
            tracing::warn!("Span cleanup failed: {}", e);
        }
    }
}
