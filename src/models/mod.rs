//! Pretrained model collaborators.
//!
//! The pipeline talks to three already-fitted objects through the traits
//! below. They are pure (no interior mutability, never refit) and shared
//! read-only across concurrent requests behind `Arc`.
//!
//! Shipped renditions:
//! - [`normalizer::MinMaxScaler`] for [`Normalizer`]
//! - [`forest::ForestRegressor`] for [`InstantHealthModel`]
//! - [`lstm::LstmRegressor`] for [`TemporalHealthModel`]
//!
//! all loaded together from a [`bundle::ModelBundle`].

pub mod bundle;
pub mod forest;
pub mod lstm;
pub mod normalizer;

use std::sync::Arc;

use crate::error::{InferenceError, SchemaError};
use crate::types::FeatureMatrix;

pub use bundle::{BundleError, BundleMetadata, ModelBundle};
pub use forest::{ForestRegressor, RegressionTree, TreeNode};
pub use lstm::LstmRegressor;
pub use normalizer::{align_channels, MinMaxScaler};

/// Rescales raw sensor readings with parameters fixed at training time.
pub trait Normalizer: Send + Sync {
    /// Trained channel names, in the column order `transform` emits.
    fn channels(&self) -> &[String];

    /// Same row count, columns in trained order.
    fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, SchemaError>;
}

/// Maps one normalized sensor vector to a scalar health estimate.
pub trait InstantHealthModel: Send + Sync {
    fn n_features(&self) -> usize;

    /// One estimate per row, in row order. Output is not clipped.
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, InferenceError>;
}

/// Maps a fixed-length window of instant-health values to the next value.
pub trait TemporalHealthModel: Send + Sync {
    /// Window length the model was trained on.
    fn window_len(&self) -> usize;

    /// One estimate per window, in window order.
    fn predict(&self, windows: &[&[f64]]) -> Result<Vec<f64>, InferenceError>;
}

/// The three collaborators injected into the pipeline at construction.
#[derive(Clone)]
pub struct PretrainedModels {
    pub normalizer: Arc<dyn Normalizer>,
    pub instant: Arc<dyn InstantHealthModel>,
    pub temporal: Arc<dyn TemporalHealthModel>,
}

impl PretrainedModels {
    pub fn new(
        normalizer: Arc<dyn Normalizer>,
        instant: Arc<dyn InstantHealthModel>,
        temporal: Arc<dyn TemporalHealthModel>,
    ) -> Self {
        Self {
            normalizer,
            instant,
            temporal,
        }
    }
}

impl std::fmt::Debug for PretrainedModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PretrainedModels")
            .field("channels", &self.normalizer.channels())
            .field("n_features", &self.instant.n_features())
            .field("window_len", &self.temporal.window_len())
            .finish()
    }
}
