//! Degradation step index.
//!
//! Rows are stably sorted by `(engine_id, cycle)`; within an engine
//! `DSI[i] = health[i-1] - health[i]` and the first row is 0. Positive means
//! health fell since the previous cycle.

use crate::types::{DsiPoint, SensorTable};

/// DSI series in `(engine_id, cycle)` order. `health` follows table row order.
pub fn degradation_index(table: &SensorTable, health: &[f64]) -> Vec<DsiPoint> {
    let records = table.records();
    let mut out = Vec::with_capacity(records.len());
    let mut prev: Option<(i64, f64)> = None;

    for i in table.sorted_order() {
        let r = &records[i];
        let dsi = match prev {
            Some((engine_id, h)) if engine_id == r.engine_id => -(health[i] - h),
            _ => 0.0,
        };
        prev = Some((r.engine_id, health[i]));
        out.push(DsiPoint {
            engine_id: r.engine_id,
            cycle: r.cycle,
            dsi,
        });
    }
    out
}
