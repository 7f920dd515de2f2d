//! Hybrid blend of instant and temporal estimates.

use crate::config::defaults::{HEALTH_CEILING, HEALTH_FLOOR, INSTANT_WEIGHT, TEMPORAL_WEIGHT};

/// `clip(0.6 * instant + 0.4 * temporal, 0, 1)`.
#[inline]
pub fn blend_one(instant: f64, temporal: f64) -> f64 {
    (INSTANT_WEIGHT * instant + TEMPORAL_WEIGHT * temporal).clamp(HEALTH_FLOOR, HEALTH_CEILING)
}

/// Elementwise blend. Both slices are aligned row for row.
pub fn blend(instant: &[f64], temporal: &[f64]) -> Vec<f64> {
    debug_assert_eq!(instant.len(), temporal.len());
    instant
        .iter()
        .zip(temporal)
        .map(|(&i, &t)| blend_one(i, t))
        .collect()
}
