//! Fleet-level decision support.
//!
//! Condenses health, DSI and the cluster table into the handful of numbers an
//! operator acts on: which engine is worst, which is declining fastest, how
//! the fleet splits across health bands, and which cluster degrades fastest.

use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::config::defaults::INSIGHTS_SUMMARY;
use crate::config::StatusThresholds;
use crate::error::PipelineError;
use crate::types::{
    ClusterPace, DegradationPace, DsiPoint, EngineDegradation, EngineProfile, FleetInsights,
    HealthStatus, SensorTable,
};

/// Derive fleet insights. `health` follows table row order, `dsi` is the
/// sorted DSI series and `clusters` the clustered engine profiles.
pub fn fleet_insights(
    table: &SensorTable,
    health: &[f64],
    dsi: &[DsiPoint],
    clusters: &[EngineProfile],
    thresholds: &StatusThresholds,
) -> Result<FleetInsights, PipelineError> {
    let worst = clusters
        .iter()
        .min_by(|a, b| {
            a.min_health
                .total_cmp(&b.min_health)
                .then(a.engine_id.cmp(&b.engine_id))
        })
        .ok_or_else(|| {
            PipelineError::DegenerateInput("fleet insights require at least one engine".into())
        })?;

    let fastest_degrader = fastest_degrader(dsi).ok_or_else(|| {
        PipelineError::DegenerateInput("no degradation index rows to rank".into())
    })?;

    let latest = latest_health(table, health);
    let fleet_avg_health = Statistics::mean(latest.values());

    let (mut healthy, mut moderate, mut critical) = (0, 0, 0);
    for &h in latest.values() {
        match HealthStatus::classify(h, thresholds) {
            HealthStatus::Healthy => healthy += 1,
            HealthStatus::Moderate => moderate += 1,
            HealthStatus::Critical => critical += 1,
        }
    }

    Ok(FleetInsights {
        summary: INSIGHTS_SUMMARY.to_string(),
        worst_engine: worst.engine_id,
        lowest_health: worst.min_health,
        cluster: worst.cluster,
        fastest_degrader,
        fleet_avg_health,
        machines_healthy: healthy,
        machines_moderate: moderate,
        machines_critical: critical,
        cluster_pace: cluster_pace(clusters),
    })
}

/// Engine with the highest mean DSI; ties go to the lowest engine id.
fn fastest_degrader(dsi: &[DsiPoint]) -> Option<EngineDegradation> {
    let mut by_engine: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for p in dsi {
        by_engine.entry(p.engine_id).or_default().push(p.dsi);
    }
    by_engine
        .into_iter()
        .map(|(engine_id, values)| EngineDegradation {
            engine_id,
            avg_dsi: Statistics::mean(&values),
        })
        .max_by(|a, b| {
            a.avg_dsi
                .total_cmp(&b.avg_dsi)
                .then(b.engine_id.cmp(&a.engine_id))
        })
}

/// Health at each engine's last row in `(engine_id, cycle)` order.
fn latest_health(table: &SensorTable, health: &[f64]) -> BTreeMap<i64, f64> {
    let records = table.records();
    table
        .sorted_order()
        .into_iter()
        .map(|i| (records[i].engine_id, health[i]))
        .collect()
}

/// Rank clusters by the degradation span of their members: engines sorted by
/// span descending (ties by engine id), clusters taken in order of first
/// appearance. First is fast, last is slow, the rest moderate.
fn cluster_pace(clusters: &[EngineProfile]) -> Vec<ClusterPace> {
    let mut ranked: Vec<&EngineProfile> = clusters.iter().collect();
    ranked.sort_by(|a, b| {
        b.degradation_span
            .total_cmp(&a.degradation_span)
            .then(a.engine_id.cmp(&b.engine_id))
    });

    let mut order: Vec<usize> = Vec::new();
    for p in ranked {
        if !order.contains(&p.cluster) {
            order.push(p.cluster);
        }
    }

    let last = order.len().saturating_sub(1);
    order
        .into_iter()
        .enumerate()
        .map(|(rank, cluster)| ClusterPace {
            cluster,
            pace: if rank == 0 {
                DegradationPace::Fast
            } else if rank == last {
                DegradationPace::Slow
            } else {
                DegradationPace::Moderate
            },
        })
        .collect()
}
