//! System-wide default constants.
//!
//! Fixed design constants (blend weights, clip bounds) live here next to the
//! defaults of every configurable value, grouped by subsystem.

// ============================================================================
// Table schema
// ============================================================================

/// Column holding the integer engine identifier.
pub const ENGINE_ID_COLUMN: &str = "engine_id";

/// Column holding the integer operating cycle.
pub const CYCLE_COLUMN: &str = "cycle";

/// Columns whose name starts with this prefix are sensor channels.
pub const SENSOR_PREFIX: &str = "sensor";

// ============================================================================
// Hybrid blend (not configurable)
// ============================================================================

/// Weight of the instantaneous regression estimate.
pub const INSTANT_WEIGHT: f64 = 0.6;

/// Weight of the temporal sequence estimate.
pub const TEMPORAL_WEIGHT: f64 = 0.4;

/// Lower clip bound for blended health.
pub const HEALTH_FLOOR: f64 = 0.0;

/// Upper clip bound for blended health.
pub const HEALTH_CEILING: f64 = 1.0;

// ============================================================================
// Reliability
// ============================================================================

/// Decay rate in `exp(-lambda * (1 - health))`.
pub const RELIABILITY_LAMBDA: f64 = 2.0;

// ============================================================================
// Clustering
// ============================================================================

/// Upper bound on the number of engine clusters.
pub const MAX_CLUSTERS: usize = 3;

/// Seed for k-means++ centroid selection.
pub const KMEANS_SEED: u64 = 42;

/// Lloyd iteration cap per k-means run.
pub const KMEANS_MAX_ITERATIONS: usize = 300;

/// Convergence tolerance, relative to the mean per-feature variance.
pub const KMEANS_TOLERANCE: f64 = 1e-4;

/// Independent k-means restarts; the lowest-inertia run wins.
pub const KMEANS_N_INIT: usize = 1;

// ============================================================================
// Health status bands
// ============================================================================

/// Latest health at or above this is `healthy`.
pub const HEALTHY_MIN: f64 = 0.75;

/// Latest health at or above this (and below `HEALTHY_MIN`) is `moderate`.
pub const MODERATE_MIN: f64 = 0.5;

/// Fixed headline of the insights payload.
pub const INSIGHTS_SUMMARY: &str = "Hybrid RF + LSTM degradation analysis completed.";

// ============================================================================
// Model bundle
// ============================================================================

/// Default location of the pretrained model bundle.
pub const MODEL_BUNDLE_PATH: &str = "models/degradix_bundle.json";

/// Bundle format version written by `save_to_disk`.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

// ============================================================================
// HTTP server
// ============================================================================

/// Default bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Upper bound on one analysis request, inference included (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Largest accepted upload (bytes). 50 MiB.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
