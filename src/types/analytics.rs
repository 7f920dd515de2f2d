//! Pipeline outputs handed to the request layer for serialization.

use serde::{Deserialize, Serialize};

/// Blended health of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthPoint {
    pub engine_id: i64,
    pub cycle: i64,
    pub health: f64,
}

/// Degradation step index of one record (positive = health fell).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DsiPoint {
    pub engine_id: i64,
    pub cycle: i64,
    #[serde(rename = "DSI")]
    pub dsi: f64,
}

/// Survival-style reliability of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityPoint {
    pub engine_id: i64,
    pub cycle: i64,
    pub reliability: f64,
}

/// Per-engine aggregate over its full health history, plus cluster label.
///
/// `cluster` is a grouping id only; use `min_health` / `degradation_span` to
/// judge severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProfile {
    pub engine_id: i64,
    pub avg_health: f64,
    pub min_health: f64,
    /// Health at the first uploaded row minus health at the last uploaded row.
    pub degradation_span: f64,
    /// Highest cycle seen for the engine.
    pub cycles: i64,
    pub cluster: usize,
}

/// Full analysis of one uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub health: Vec<HealthPoint>,
    pub dsi: Vec<DsiPoint>,
    pub reliability: Vec<ReliabilityPoint>,
    pub clusters: Vec<EngineProfile>,
}

/// Health band of an engine's latest score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Moderate,
    Critical,
}

impl HealthStatus {
    /// Classify a health score against the configured band floors.
    pub fn classify(health: f64, thresholds: &crate::config::StatusThresholds) -> Self {
        if health >= thresholds.healthy_min {
            Self::Healthy
        } else if health >= thresholds.moderate_min {
            Self::Moderate
        } else {
            Self::Critical
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Moderate => write!(f, "moderate"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Relative degradation speed of a cluster, ranked by member span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationPace {
    Fast,
    Moderate,
    Slow,
}

/// Pace label attached to a numeric cluster id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPace {
    pub cluster: usize,
    pub pace: DegradationPace,
}

/// Engine with the steepest average decline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineDegradation {
    pub engine_id: i64,
    pub avg_dsi: f64,
}

/// Fleet-level decision support derived from health, DSI and clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetInsights {
    pub summary: String,
    pub worst_engine: i64,
    pub lowest_health: f64,
    pub cluster: usize,
    pub fastest_degrader: EngineDegradation,
    pub fleet_avg_health: f64,
    pub machines_healthy: usize,
    pub machines_moderate: usize,
    pub machines_critical: usize,
    pub cluster_pace: Vec<ClusterPace>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusThresholds;

    #[test]
    fn test_status_band_edges() {
        let t = StatusThresholds::default();
        assert_eq!(HealthStatus::classify(0.75, &t), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify(0.7499, &t), HealthStatus::Moderate);
        assert_eq!(HealthStatus::classify(0.5, &t), HealthStatus::Moderate);
        assert_eq!(HealthStatus::classify(0.4999, &t), HealthStatus::Critical);
    }

    #[test]
    fn test_dsi_serializes_upper_case() {
        let point = DsiPoint {
            engine_id: 1,
            cycle: 2,
            dsi: 0.25,
        };
        let v = serde_json::to_value(point).unwrap();
        assert_eq!(v["DSI"], 0.25);
        assert!(v.get("dsi").is_none());
    }
}
