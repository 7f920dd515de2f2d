//! Survival-style reliability: `exp(-lambda * (1 - health))`.

use crate::types::{ReliabilityPoint, SensorTable};

#[inline]
pub fn reliability(health: f64, lambda: f64) -> f64 {
    (-lambda * (1.0 - health)).exp()
}

/// Reliability per row, in table row order.
pub fn reliability_series(
    table: &SensorTable,
    health: &[f64],
    lambda: f64,
) -> Vec<ReliabilityPoint> {
    table
        .records()
        .iter()
        .zip(health)
        .map(|(r, &h)| ReliabilityPoint {
            engine_id: r.engine_id,
            cycle: r.cycle,
            reliability: reliability(h, lambda),
        })
        .collect()
}
