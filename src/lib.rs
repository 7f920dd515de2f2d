//! DEGRADIX: Engine Health Scoring & Degradation Analytics
//!
//! Scores engine health from multi-sensor run data and derives degradation
//! trend, reliability and fleet grouping.
//!
//! ## Architecture
//!
//! - **Dataset**: CSV upload to a typed [`SensorTable`]
//! - **Models**: pretrained normalizer, regression forest and LSTM behind
//!   injectable traits, loaded from one JSON bundle
//! - **Pipeline**: hybrid health blend, DSI, reliability, engine clustering,
//!   fleet insights
//! - **API**: axum request layer with a uniform JSON envelope

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod types;

pub use config::DegradixConfig;
pub use error::{InferenceError, PipelineError, SchemaError};
pub use models::{ModelBundle, PretrainedModels};
pub use pipeline::AnalysisPipeline;
pub use types::{
    AnalysisReport, DsiPoint, EngineProfile, FleetInsights, HealthPoint, ReliabilityPoint,
    SensorRecord, SensorTable,
};
