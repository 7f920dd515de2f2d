//! Pipeline error taxonomy.
//!
//! Every failure the analytics pipeline can surface falls into one of three
//! families, so callers can tell a malformed upload from a model mismatch:
//!
//! - [`SchemaError`]: the table is missing required columns or channels, or a
//!   cell cannot be read. Rejected before any model is invoked.
//! - [`InferenceError`]: a pretrained model was handed input of the wrong shape
//!   or produced unusable output. Fatal for the request.
//! - `DegenerateInput`: an aggregate was requested over nothing (e.g. fleet
//!   insights with zero engines).
//!
//! Errors propagate unmodified; the pipeline never retries because inference
//! is deterministic for a fixed input.

use thiserror::Error;

/// Top-level error returned by pipeline entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}

impl PipelineError {
    /// Stable machine-readable code for the violated contract.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::Inference(_) => "INFERENCE_ERROR",
            Self::DegenerateInput(_) => "DEGENERATE_INPUT",
        }
    }
}

/// Input table does not satisfy the column / channel contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("table has no header row")]
    EmptyHeader,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no sensor channels found (expected columns prefixed with '{prefix}')")]
    NoSensorChannels { prefix: String },

    #[error("missing sensor channels expected by the normalizer: {}", .0.join(", "))]
    MissingChannels(Vec<String>),

    #[error("sensor channels not seen at training time: {}", .0.join(", "))]
    UnexpectedChannels(Vec<String>),

    #[error("row {row}: expected {expected} fields, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': '{value}' is not a valid {kind}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        kind: &'static str,
    },
}

/// A pretrained model rejected its input or produced unusable output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("{model} expects {expected} features per row, input has {found}")]
    FeatureDimension {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{model} expects windows of length {expected}, got {found}")]
    WindowLength {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{model} returned {found} predictions for {expected} inputs")]
    OutputLength {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{model} produced a non-finite prediction at index {index}")]
    NonFinite { model: &'static str, index: usize },
}
