//! Model bundle persistence.
//!
//! The offline training job exports the scaler, forest and LSTM into one JSON
//! document. It is loaded once at startup, validated, and turned into the
//! shared [`PretrainedModels`]. Saving is atomic (temp file, then rename).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::forest::ForestRegressor;
use super::lstm::LstmRegressor;
use super::normalizer::MinMaxScaler;
use super::{InstantHealthModel, PretrainedModels};
use crate::config::defaults::BUNDLE_FORMAT_VERSION;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read or write model bundle {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("model bundle is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model bundle format version {found} is not supported (expected {expected})")]
    Version { expected: u32, found: u32 },
    #[error("invalid model bundle: {0}")]
    Invalid(String),
}

/// Provenance of a bundle. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub name: String,
    #[serde(default)]
    pub trained_at: Option<String>,
    /// Dataset the models were fit on.
    #[serde(default)]
    pub source: Option<String>,
}

/// All three pretrained collaborators in one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Format version for forward compatibility.
    pub version: u32,
    #[serde(default)]
    pub metadata: BundleMetadata,
    pub scaler: MinMaxScaler,
    pub forest: ForestRegressor,
    pub lstm: LstmRegressor,
}

impl ModelBundle {
    pub fn new(
        metadata: BundleMetadata,
        scaler: MinMaxScaler,
        forest: ForestRegressor,
        lstm: LstmRegressor,
    ) -> Self {
        Self {
            version: BUNDLE_FORMAT_VERSION,
            metadata,
            scaler,
            forest,
            lstm,
        }
    }

    /// Check each model and their compatibility with one another.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.version != BUNDLE_FORMAT_VERSION {
            return Err(BundleError::Version {
                expected: BUNDLE_FORMAT_VERSION,
                found: self.version,
            });
        }
        self.scaler
            .validate()
            .map_err(|e| BundleError::Invalid(format!("scaler: {e}")))?;
        self.forest
            .validate()
            .map_err(|e| BundleError::Invalid(format!("forest: {e}")))?;
        self.lstm
            .validate()
            .map_err(|e| BundleError::Invalid(format!("lstm: {e}")))?;

        if self.scaler.channels.len() != self.forest.n_features() {
            return Err(BundleError::Invalid(format!(
                "scaler emits {} channels but forest expects {} features",
                self.scaler.channels.len(),
                self.forest.n_features()
            )));
        }
        Ok(())
    }

    /// Share the models for injection into the pipeline.
    pub fn into_models(self) -> PretrainedModels {
        PretrainedModels::new(
            Arc::new(self.scaler),
            Arc::new(self.forest),
            Arc::new(self.lstm),
        )
    }
}

/// Save a bundle to disk atomically (write temp file, then rename).
pub fn save_to_disk(bundle: &ModelBundle, path: &Path) -> Result<(), BundleError> {
    let json = serde_json::to_vec_pretty(bundle)?;
    let io_err = |e| BundleError::Io(path.to_path_buf(), e);

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Load and validate a bundle, returning it with the MD5 hex digest of the
/// file bytes.
pub fn load_from_disk(path: &Path) -> Result<(ModelBundle, String), BundleError> {
    let data = std::fs::read(path).map_err(|e| BundleError::Io(path.to_path_buf(), e))?;
    let fingerprint = format!("{:x}", md5::compute(&data));
    let bundle: ModelBundle = serde_json::from_slice(&data)?;
    bundle.validate()?;

    info!(
        path = %path.display(),
        name = %bundle.metadata.name,
        channels = bundle.scaler.channels.len(),
        trees = bundle.forest.trees.len(),
        nodes = bundle.forest.num_nodes(),
        seq_len = bundle.lstm.seq_len,
        lstm_params = bundle.lstm.num_params(),
        fingerprint = %fingerprint,
        "Loaded model bundle"
    );
    Ok((bundle, fingerprint))
}
