//! Min-max feature scaling with parameters fixed at training time.
//!
//! Each trained channel is rescaled independently:
//!
//! ```text
//! scale[j]  = (hi - lo) / (data_max[j] - data_min[j])     (zero range -> 1)
//! offset[j] = lo - data_min[j] * scale[j]
//! x'[j]     = x[j] * scale[j] + offset[j]
//! ```
//!
//! Values outside the training range map outside `[lo, hi]`; nothing is
//! clipped here.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Normalizer;
use crate::error::SchemaError;
use crate::types::FeatureMatrix;

/// Select the `expected` channels from `matrix`, in `expected` order.
///
/// Missing channels are always an error. Channels the model was not fit on
/// are an error unless `allow_extra` is set, in which case they are dropped.
pub fn align_channels(
    matrix: &FeatureMatrix,
    expected: &[String],
    allow_extra: bool,
) -> Result<FeatureMatrix, SchemaError> {
    if matrix.channels == expected {
        return Ok(matrix.clone());
    }

    let missing: Vec<String> = expected
        .iter()
        .filter(|c| !matrix.channels.contains(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingChannels(missing));
    }

    let extra: Vec<String> = matrix
        .channels
        .iter()
        .filter(|c| !expected.contains(c))
        .cloned()
        .collect();
    if !extra.is_empty() {
        if !allow_extra {
            return Err(SchemaError::UnexpectedChannels(extra));
        }
        warn!(dropped = ?extra, "Ignoring sensor channels not seen at training time");
    }

    let columns: Vec<usize> = expected
        .iter()
        .filter_map(|c| matrix.channels.iter().position(|m| m == c))
        .collect();
    Ok(FeatureMatrix {
        channels: expected.to_vec(),
        rows: matrix
            .rows
            .iter()
            .map(|row| columns.iter().map(|&j| row[j]).collect())
            .collect(),
    })
}

/// Fitted min-max scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Trained channel order.
    pub channels: Vec<String>,
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    /// Target range `(lo, hi)`.
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

const fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl MinMaxScaler {
    /// Scaler onto `[0, 1]` from per-channel training minima and maxima.
    pub fn new(channels: Vec<String>, data_min: Vec<f64>, data_max: Vec<f64>) -> Self {
        Self {
            channels,
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Check parameter shapes and values.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.channels.len();
        if n == 0 {
            return Err("scaler has no channels".to_string());
        }
        if self.data_min.len() != n || self.data_max.len() != n {
            return Err(format!(
                "scaler parameter length mismatch: {} channels, {} minima, {} maxima",
                n,
                self.data_min.len(),
                self.data_max.len()
            ));
        }
        if self
            .data_min
            .iter()
            .chain(&self.data_max)
            .any(|v| !v.is_finite())
        {
            return Err("scaler parameters must be finite".to_string());
        }
        let (lo, hi) = self.feature_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(format!("invalid feature_range ({lo}, {hi})"));
        }
        Ok(())
    }

    fn scale_and_offset(&self, j: usize) -> (f64, f64) {
        let (lo, hi) = self.feature_range;
        let range = self.data_max[j] - self.data_min[j];
        let range = if range == 0.0 { 1.0 } else { range };
        let scale = (hi - lo) / range;
        (scale, lo - self.data_min[j] * scale)
    }
}

impl Normalizer for MinMaxScaler {
    fn channels(&self) -> &[String] {
        &self.channels
    }

    fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, SchemaError> {
        let aligned = align_channels(matrix, &self.channels, false)?;
        let params: Vec<(f64, f64)> = (0..self.channels.len())
            .map(|j| self.scale_and_offset(j))
            .collect();

        let rows = aligned
            .rows
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&params)
                    .map(|(x, (scale, offset))| x * scale + offset)
                    .collect()
            })
            .collect();

        Ok(FeatureMatrix {
            channels: aligned.channels,
            rows,
        })
    }
}
