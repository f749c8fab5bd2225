//! Facility Rotation - deterministic stock rotation for long-lived facilities
//!
//! Facilities (shops, stalls, quartermasters) rotate through a weighted
//! catalog of stock variants on a per-facility desynchronized schedule.
//! Unvisited facilities can be previewed without mutation, and the first
//! real regeneration reproduces what the preview showed.

pub mod catalog;
pub mod core;
pub mod persistence;
pub mod rotation;
