//! Deterministic weighted variant selection
//!
//! Selection consumes no RNG state: the roll is derived from a seed that is
//! itself a pure function of `(facility id, effective tick)`. Same inputs,
//! same variant, every time.

use crate::core::error::{Result, RotationError};
use crate::core::types::{FacilityId, Tick};

/// A selectable catalog entry with a context-dependent weight
pub trait Variant {
    type Context;

    /// Relative selection weight. Non-positive or non-finite means "never".
    fn weight(&self, ctx: &Self::Context) -> f64;
}

/// Stable combine of facility identity and effective tick
pub fn rotation_seed(id: FacilityId, tick: Tick) -> u64 {
    let mut h = id.raw().wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= tick;
    h = h.wrapping_mul(6364136223846793005);
    h = h.wrapping_add(1442695040888963407);
    h ^ (h >> 32)
}

fn usable_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// The seed reduced modulo the total weight: `seed mod total` in `[0, total)`
pub fn weighted_roll(seed: u64, total: f64) -> f64 {
    (seed as f64) % total
}

/// Pick the candidate whose cumulative weight range contains the seed's roll
pub fn select_variant<'a, V: Variant>(
    seed: u64,
    catalog: &'a [V],
    ctx: &V::Context,
) -> Result<&'a V> {
    let mut cumulative = Vec::with_capacity(catalog.len());
    let mut total = 0.0;
    for variant in catalog {
        total += usable_weight(variant.weight(ctx));
        cumulative.push(total);
    }

    if total <= 0.0 {
        return Err(RotationError::EmptyCatalog { facility: None });
    }

    let roll = weighted_roll(seed, total);
    if let Some(idx) = cumulative.iter().position(|&c| roll < c) {
        return Ok(&catalog[idx]);
    }

    // Round-off can leave roll == total; take the last candidate that can win
    catalog
        .iter()
        .rev()
        .find(|v| usable_weight(v.weight(ctx)) > 0.0)
        .ok_or(RotationError::EmptyCatalog { facility: None })
}
