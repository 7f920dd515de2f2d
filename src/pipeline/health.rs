//! Hybrid health estimation: normalize, instant model, temporal model, blend.

use tracing::debug;

use super::{blend, temporal};
use crate::config::WindowingMode;
use crate::error::{InferenceError, PipelineError};
use crate::models::{align_channels, PretrainedModels};
use crate::types::SensorTable;

const INSTANT_MODEL: &str = "instant health model";

/// Per-row estimates from each stage. All three vectors follow table row order.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthEstimate {
    pub instant: Vec<f64>,
    pub temporal: Vec<f64>,
    /// Blended score in `[0, 1]`.
    pub health: Vec<f64>,
}

impl HealthEstimate {
    fn empty() -> Self {
        Self {
            instant: Vec::new(),
            temporal: Vec::new(),
            health: Vec::new(),
        }
    }
}

/// Run the two-stage health model over every row of `table`.
///
/// Channel alignment happens first, so a table with the wrong sensors is
/// rejected with a schema error before any model runs.
pub fn estimate(
    models: &PretrainedModels,
    table: &SensorTable,
    windowing: WindowingMode,
    allow_extra_channels: bool,
) -> Result<HealthEstimate, PipelineError> {
    let aligned = align_channels(
        &table.feature_matrix(),
        models.normalizer.channels(),
        allow_extra_channels,
    )?;
    if table.is_empty() {
        return Ok(HealthEstimate::empty());
    }

    let n = table.len();
    let normalized = models.normalizer.transform(&aligned)?;
    check_len("normalizer", n, normalized.n_rows())?;

    if normalized.n_cols() != models.instant.n_features() {
        return Err(InferenceError::FeatureDimension {
            model: INSTANT_MODEL,
            expected: models.instant.n_features(),
            found: normalized.n_cols(),
        }
        .into());
    }
    let instant = models.instant.predict(&normalized)?;
    check_len(INSTANT_MODEL, n, instant.len())?;
    check_finite(INSTANT_MODEL, &instant)?;

    let temporal =
        temporal::temporal_estimates(models.temporal.as_ref(), table, &instant, windowing)?;
    check_len("temporal health model", n, temporal.len())?;

    let health = blend::blend(&instant, &temporal);
    debug!(rows = n, windowing = %windowing, "Health estimated");

    Ok(HealthEstimate {
        instant,
        temporal,
        health,
    })
}

fn check_len(model: &'static str, expected: usize, found: usize) -> Result<(), InferenceError> {
    if expected == found {
        Ok(())
    } else {
        Err(InferenceError::OutputLength {
            model,
            expected,
            found,
        })
    }
}

/// Reject the first NaN or infinite prediction.
pub(super) fn check_finite(model: &'static str, values: &[f64]) -> Result<(), InferenceError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(InferenceError::NonFinite { model, index }),
        None => Ok(()),
    }
}
