//! Sliding windows over instant-health estimates.
//!
//! For a series of `n` values and a model window of `SEQ_LEN`:
//!
//! ```text
//! n <= SEQ_LEN   temporal = instant (model not invoked)
//! n >  SEQ_LEN   windows start at 0 .. n-SEQ_LEN-1, each predicts the value
//!                after it; predictions land at SEQ_LEN .. n-1 and positions
//!                0 .. SEQ_LEN-1 repeat the first prediction
//! ```

use tracing::debug;

use super::engine_groups;
use super::health::check_finite;
use crate::config::WindowingMode;
use crate::error::InferenceError;
use crate::models::TemporalHealthModel;
use crate::types::SensorTable;

const MODEL_NAME: &str = "temporal health model";

/// Temporal estimate for each row of `table`, aligned with `instant`.
pub fn temporal_estimates(
    model: &dyn TemporalHealthModel,
    table: &SensorTable,
    instant: &[f64],
    mode: WindowingMode,
) -> Result<Vec<f64>, InferenceError> {
    match mode {
        WindowingMode::Global => sequence_estimates(model, instant),
        WindowingMode::PerEngine => {
            let mut out = instant.to_vec();
            for (engine_id, rows) in engine_groups(table) {
                let series: Vec<f64> = rows.iter().map(|&i| instant[i]).collect();
                let estimates = sequence_estimates(model, &series)?;
                debug!(engine_id, rows = rows.len(), "Windowed engine");
                for (&i, v) in rows.iter().zip(estimates) {
                    out[i] = v;
                }
            }
            Ok(out)
        }
    }
}

/// Apply the windowing policy to one contiguous series.
pub fn sequence_estimates(
    model: &dyn TemporalHealthModel,
    series: &[f64],
) -> Result<Vec<f64>, InferenceError> {
    let seq_len = model.window_len();
    let n = series.len();
    if n <= seq_len {
        return Ok(series.to_vec());
    }

    let windows: Vec<&[f64]> = (0..n - seq_len).map(|s| &series[s..s + seq_len]).collect();
    let preds = model.predict(&windows)?;
    if preds.len() != windows.len() {
        return Err(InferenceError::OutputLength {
            model: MODEL_NAME,
            expected: windows.len(),
            found: preds.len(),
        });
    }
    check_finite(MODEL_NAME, &preds)?;

    let mut out = vec![preds[0]; seq_len];
    out.extend(preds);
    Ok(out)
}
