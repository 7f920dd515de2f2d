//! Domain types shared by the dataset reader, the pipeline and the API.
//!
//! - [`records`]: the uploaded sensor table and its feature matrix
//! - [`analytics`]: per-row series, engine profiles, fleet insights

pub mod analytics;
pub mod records;

pub use analytics::{
    AnalysisReport, ClusterPace, DegradationPace, DsiPoint, EngineDegradation, EngineProfile,
    FleetInsights, HealthPoint, HealthStatus, ReliabilityPoint,
};
pub use records::{FeatureMatrix, SensorRecord, SensorTable};
