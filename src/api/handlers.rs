//! Request handlers.
//!
//! Every analysis endpoint parses the upload and runs the pipeline on a
//! blocking worker thread, bounded by the configured request timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;
use tracing::{error, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::upload::CsvUpload;
use crate::config::DegradixConfig;
use crate::dataset;
use crate::error::PipelineError;
use crate::models::ModelBundle;
use crate::pipeline::AnalysisPipeline;
use crate::types::SensorTable;

/// Provenance of the models behind the pipeline, reported by `/status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BundleInfo {
    pub name: String,
    pub format_version: u32,
    pub trained_at: Option<String>,
    pub source: Option<String>,
    /// MD5 of the bundle file.
    pub fingerprint: Option<String>,
}

impl BundleInfo {
    pub fn from_bundle(bundle: &ModelBundle, fingerprint: String) -> Self {
        Self {
            name: bundle.metadata.name.clone(),
            format_version: bundle.version,
            trained_at: bundle.metadata.trained_at.clone(),
            source: bundle.metadata.source.clone(),
            fingerprint: Some(fingerprint),
        }
    }
}

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub bundle: Arc<BundleInfo>,
    pub sensor_prefix: Arc<str>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl ApiState {
    pub fn new(pipeline: AnalysisPipeline, bundle: BundleInfo, config: &DegradixConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            bundle: Arc::new(bundle),
            sensor_prefix: Arc::from(config.pipeline.sensor_prefix.as_str()),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            max_body_bytes: config.server.max_body_bytes,
            cors_origins: config.server.cors_origins.clone(),
        }
    }
}

/// Parse the upload and run `op` off the async runtime.
async fn run<T, F>(state: &ApiState, endpoint: &'static str, upload: CsvUpload, op: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&AnalysisPipeline, &SensorTable) -> Result<T, PipelineError> + Send + 'static,
{
    let pipeline = Arc::clone(&state.pipeline);
    let prefix = Arc::clone(&state.sensor_prefix);
    let job = tokio::task::spawn_blocking(move || {
        let table = dataset::parse_csv(&upload.0, &prefix)?;
        op(pipeline.as_ref(), &table)
    });

    match tokio::time::timeout(state.request_timeout, job).await {
        Ok(Ok(Ok(data))) => ApiResponse::ok(data),
        Ok(Ok(Err(e))) => {
            warn!(endpoint, code = e.code(), error = %e, "Analysis rejected");
            ApiErrorResponse::pipeline(&e)
        }
        Ok(Err(e)) => {
            error!(endpoint, error = %e, "Analysis worker failed");
            ApiErrorResponse::internal("analysis worker failed")
        }
        Err(_) => {
            warn!(endpoint, timeout_secs = state.request_timeout.as_secs(), "Analysis timed out");
            ApiErrorResponse::timeout(format!(
                "analysis exceeded {}s",
                state.request_timeout.as_secs()
            ))
        }
    }
}

pub async fn analyze(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "analyze", upload, |p, t| p.analyze(t)).await
}

pub async fn health(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "health", upload, |p, t| p.health(t)).await
}

pub async fn dsi(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "dsi", upload, |p, t| p.dsi(t)).await
}

pub async fn reliability(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "reliability", upload, |p, t| p.reliability(t)).await
}

pub async fn clusters(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "clusters", upload, |p, t| p.clusters(t)).await
}

pub async fn insights(State(state): State<ApiState>, upload: CsvUpload) -> Response {
    run(&state, "insights", upload, |p, t| p.insights(t)).await
}

#[derive(Debug, Serialize)]
struct StatusV1 {
    service: &'static str,
    version: &'static str,
    bundle: BundleInfo,
    channels: Vec<String>,
    n_features: usize,
    seq_len: usize,
    windowing: String,
}

/// GET /status
pub async fn status(State(state): State<ApiState>) -> Response {
    let models = state.pipeline.models();
    ApiResponse::ok(StatusV1 {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        bundle: state.bundle.as_ref().clone(),
        channels: models.normalizer.channels().to_vec(),
        n_features: models.instant.n_features(),
        seq_len: state.pipeline.seq_len(),
        windowing: state.pipeline.windowing().to_string(),
    })
}

/// Fallback for unknown paths.
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("no such endpoint")
}
