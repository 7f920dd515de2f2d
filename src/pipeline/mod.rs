//! Health Scoring & Degradation Analytics Pipeline
//!
//! ```text
//! SensorTable
//!   -> Normalizer -> Instant model ----------------+
//!                      -> windows -> Temporal model -+-> Blend (health)
//!                                                          |-> DSI
//!                                                          |-> Reliability
//!                                                          |-> Clustering
//!                                        DSI + clusters ---+-> Insights
//! ```
//!
//! One [`AnalysisPipeline`] is built at startup and shared by every request.
//! Each call computes health once and derives everything else from it; nothing
//! is cached between calls, so identical tables give bit-identical results.

pub mod blend;
pub mod clustering;
pub mod dsi;
pub mod health;
pub mod insights;
pub mod kmeans;
pub mod reliability;
pub mod temporal;

pub use health::HealthEstimate;

use tracing::{debug, info};

use crate::config::{ClusteringConfig, DegradixConfig, StatusThresholds, WindowingMode};
use crate::error::PipelineError;
use crate::models::PretrainedModels;
use crate::types::{
    AnalysisReport, DsiPoint, EngineProfile, FleetInsights, HealthPoint, ReliabilityPoint,
    SensorTable,
};

/// Row indices grouped per engine, engines ascending, rows in cycle order.
pub(crate) fn engine_groups(table: &SensorTable) -> Vec<(i64, Vec<usize>)> {
    let records = table.records();
    let mut groups: Vec<(i64, Vec<usize>)> = Vec::new();
    for i in table.sorted_order() {
        let engine_id = records[i].engine_id;
        match groups.last_mut() {
            Some((id, rows)) if *id == engine_id => rows.push(i),
            _ => groups.push((engine_id, vec![i])),
        }
    }
    groups
}

/// Entry points for every analytics product, over injected pretrained models.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    models: PretrainedModels,
    windowing: WindowingMode,
    reliability_lambda: f64,
    allow_extra_channels: bool,
    clustering: ClusteringConfig,
    status: StatusThresholds,
}

impl AnalysisPipeline {
    pub fn new(models: PretrainedModels, config: &DegradixConfig) -> Self {
        Self {
            models,
            windowing: config.pipeline.windowing,
            reliability_lambda: config.pipeline.reliability_lambda,
            allow_extra_channels: config.pipeline.allow_extra_channels,
            clustering: config.clustering.clone(),
            status: config.status.clone(),
        }
    }

    pub fn models(&self) -> &PretrainedModels {
        &self.models
    }

    pub fn windowing(&self) -> WindowingMode {
        self.windowing
    }

    /// Window length of the temporal model.
    pub fn seq_len(&self) -> usize {
        self.models.temporal.window_len()
    }

    /// Instant, temporal and blended estimates for every row.
    pub fn estimate(&self, table: &SensorTable) -> Result<HealthEstimate, PipelineError> {
        health::estimate(
            &self.models,
            table,
            self.windowing,
            self.allow_extra_channels,
        )
    }

    /// Blended health per row, in table row order.
    pub fn health(&self, table: &SensorTable) -> Result<Vec<HealthPoint>, PipelineError> {
        let estimate = self.estimate(table)?;
        Ok(health_points(table, &estimate.health))
    }

    /// DSI per row, in `(engine_id, cycle)` order.
    pub fn dsi(&self, table: &SensorTable) -> Result<Vec<DsiPoint>, PipelineError> {
        let estimate = self.estimate(table)?;
        Ok(dsi::degradation_index(table, &estimate.health))
    }

    /// Reliability per row, in table row order.
    pub fn reliability(&self, table: &SensorTable) -> Result<Vec<ReliabilityPoint>, PipelineError> {
        let estimate = self.estimate(table)?;
        Ok(reliability::reliability_series(
            table,
            &estimate.health,
            self.reliability_lambda,
        ))
    }

    /// Clustered engine profiles, ascending by engine id.
    pub fn clusters(&self, table: &SensorTable) -> Result<Vec<EngineProfile>, PipelineError> {
        let estimate = self.estimate(table)?;
        Ok(clustering::cluster_engines(
            table,
            &estimate.health,
            &self.clustering,
        ))
    }

    /// Fleet insights; fails with `DegenerateInput` for a table with no rows.
    pub fn insights(&self, table: &SensorTable) -> Result<FleetInsights, PipelineError> {
        let estimate = self.estimate(table)?;
        let dsi = dsi::degradation_index(table, &estimate.health);
        let clusters = clustering::cluster_engines(table, &estimate.health, &self.clustering);
        insights::fleet_insights(table, &estimate.health, &dsi, &clusters, &self.status)
    }

    /// Health, DSI, reliability and clusters from a single health pass.
    pub fn analyze(&self, table: &SensorTable) -> Result<AnalysisReport, PipelineError> {
        let estimate = self.estimate(table)?;
        let h = &estimate.health;

        let report = AnalysisReport {
            health: health_points(table, h),
            dsi: dsi::degradation_index(table, h),
            reliability: reliability::reliability_series(table, h, self.reliability_lambda),
            clusters: clustering::cluster_engines(table, h, &self.clustering),
        };

        info!(
            rows = table.len(),
            engines = report.clusters.len(),
            windowing = %self.windowing,
            "Analysis complete"
        );
        debug!(
            clusters = report
                .clusters
                .iter()
                .map(|p| p.cluster)
                .max()
                .map_or(0, |m| m + 1),
            "Cluster count"
        );
        Ok(report)
    }
}

fn health_points(table: &SensorTable, health: &[f64]) -> Vec<HealthPoint> {
    table
        .records()
        .iter()
        .zip(health)
        .map(|(r, &health)| HealthPoint {
            engine_id: r.engine_id,
            cycle: r.cycle,
            health,
        })
        .collect()
}
