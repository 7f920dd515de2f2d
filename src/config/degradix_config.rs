//! DEGRADIX configuration - operator-tunable pipeline, clustering and server values
//!
//! Each struct implements `Default` with the values in [`super::defaults`], so
//! a missing file or a partial file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DEGRADIX_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "degradix.toml";

// ============================================================================
// Config Provenance
// ============================================================================

/// Dotted key paths explicitly present in the user's TOML file.
///
/// After deserialization every `#[serde(default)]` field has a value; this
/// keeps the distinction between "user chose this" and "default".
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    /// Example: `provenance.is_user_set("pipeline.windowing")`
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `DegradixConfig::load()` which searches:
/// 1. `$DEGRADIX_CONFIG`
/// 2. `./degradix.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DegradixConfig {
    /// Health pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Engine clustering
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Health status bands used by fleet insights
    #[serde(default)]
    pub status: StatusThresholds,

    /// Pretrained model artifacts
    #[serde(default)]
    pub models: ModelsConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

impl DegradixConfig {
    /// Load configuration using the standard search order, logging (not
    /// failing) on a bad file.
    pub fn load() -> Self {
        Self::load_with_provenance().0
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, _provenance) = Self::load_from_file_with_provenance(path)?;
        Ok(config)
    }

    /// Load from a specific TOML file path, also returning provenance.
    pub fn load_from_file_with_provenance(
        path: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<(Self, ConfigProvenance), ConfigError> {
        // Two-pass: unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let provenance = ConfigProvenance {
            explicit_keys: super::validation::walk_toml_keys(
                &contents
                    .parse::<toml::Value>()
                    .unwrap_or(toml::Value::Table(toml::map::Map::new())),
                "",
            )
            .into_iter()
            .collect(),
        };

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok((config, provenance))
    }

    /// Standard search order, returning provenance of explicit keys.
    pub fn load_with_provenance() -> (Self, ConfigProvenance) {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file_with_provenance(&p) {
                    Ok(loaded) => {
                        info!(path = %p.display(), "Loaded config from {CONFIG_ENV_VAR}");
                        return loaded;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {CONFIG_ENV_VAR}, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        // 2. Check ./degradix.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file_with_provenance(&local) {
                Ok(loaded) => {
                    info!("Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return loaded;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        (Self::default(), ConfigProvenance::default())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Reliability lambda must be finite and > 0
    /// - Status floors must lie in [0, 1] with healthy > moderate
    /// - Clustering needs at least one cluster, one iteration and one init
    /// - Server limits must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let lambda = self.pipeline.reliability_lambda;
        if !lambda.is_finite() || lambda <= 0.0 {
            errors.push(format!(
                "pipeline.reliability_lambda must be finite and > 0 (got {lambda})"
            ));
        }
        if self.pipeline.sensor_prefix.trim().is_empty() {
            errors.push("pipeline.sensor_prefix must not be empty".to_string());
        }

        let s = &self.status;
        for (name, value) in [
            ("status.healthy_min", s.healthy_min),
            ("status.moderate_min", s.moderate_min),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must lie in [0, 1] (got {value})"));
            }
        }
        if s.healthy_min <= s.moderate_min {
            errors.push(format!(
                "status.healthy_min ({:.3}) must be > status.moderate_min ({:.3})",
                s.healthy_min, s.moderate_min
            ));
        }

        let c = &self.clustering;
        if c.max_clusters == 0 {
            errors.push("clustering.max_clusters must be > 0".to_string());
        }
        if c.max_iterations == 0 {
            errors.push("clustering.max_iterations must be > 0".to_string());
        }
        if c.n_init == 0 {
            errors.push("clustering.n_init must be > 0".to_string());
        }
        if !c.tolerance.is_finite() || c.tolerance < 0.0 {
            errors.push(format!(
                "clustering.tolerance must be finite and >= 0 (got {})",
                c.tolerance
            ));
        }

        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be > 0".to_string());
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Scope of the sliding windows fed to the temporal model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowingMode {
    /// One window sequence over the whole health array in upload order.
    /// Windows may straddle engines when engines are interleaved.
    #[default]
    Global,
    /// Each engine's rows, ordered by cycle, are windowed on their own.
    PerEngine,
}

impl std::fmt::Display for WindowingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PerEngine => write!(f, "per_engine"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub windowing: WindowingMode,
    pub reliability_lambda: f64,
    pub sensor_prefix: String,
    /// Ignore sensor channels the normalizer was not fit on instead of
    /// rejecting the upload.
    pub allow_extra_channels: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windowing: WindowingMode::default(),
            reliability_lambda: defaults::RELIABILITY_LAMBDA,
            sensor_prefix: defaults::SENSOR_PREFIX.to_string(),
            allow_extra_channels: false,
        }
    }
}

// ============================================================================
// Clustering
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub max_clusters: usize,
    pub seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub n_init: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_clusters: defaults::MAX_CLUSTERS,
            seed: defaults::KMEANS_SEED,
            max_iterations: defaults::KMEANS_MAX_ITERATIONS,
            tolerance: defaults::KMEANS_TOLERANCE,
            n_init: defaults::KMEANS_N_INIT,
        }
    }
}

// ============================================================================
// Status bands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub healthy_min: f64,
    pub moderate_min: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            healthy_min: defaults::HEALTHY_MIN,
            moderate_min: defaults::MODERATE_MIN,
        }
    }
}

// ============================================================================
// Models & server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub bundle_path: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            bundle_path: PathBuf::from(defaults::MODEL_BUNDLE_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    /// Allowed CORS origins; empty means same-origin only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            max_body_bytes: defaults::MAX_BODY_BYTES,
            cors_origins: Vec::new(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
