//! Per-engine health profiles and their k-means partition.

use std::collections::BTreeMap;

use statrs::statistics::Statistics;
use tracing::debug;

use super::kmeans;
use crate::config::ClusteringConfig;
use crate::types::{EngineProfile, SensorTable};

/// Aggregate each engine's health history, ascending by engine id.
/// Every profile starts in cluster 0.
pub fn engine_profiles(table: &SensorTable, health: &[f64]) -> Vec<EngineProfile> {
    let mut by_engine: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, r) in table.records().iter().enumerate() {
        by_engine.entry(r.engine_id).or_default().push(i);
    }

    by_engine
        .into_iter()
        .filter_map(|(engine_id, rows)| {
            let first = *rows.first()?;
            let last = *rows.last()?;
            let values = rows.iter().map(|&i| health[i]);
            Some(EngineProfile {
                engine_id,
                avg_health: Statistics::mean(values.clone()),
                min_health: Statistics::min(values),
                degradation_span: health[first] - health[last],
                cycles: rows.iter().map(|&i| table.records()[i].cycle).max()?,
                cluster: 0,
            })
        })
        .collect()
}

/// Engine profiles with cluster labels from k-means over
/// `[avg_health, min_health, degradation_span, cycles]`,
/// `k = min(max_clusters, engines)`.
pub fn cluster_engines(
    table: &SensorTable,
    health: &[f64],
    config: &ClusteringConfig,
) -> Vec<EngineProfile> {
    let mut profiles = engine_profiles(table, health);
    if profiles.is_empty() {
        return profiles;
    }

    #[allow(clippy::cast_precision_loss)]
    let features: Vec<Vec<f64>> = profiles
        .iter()
        .map(|p| vec![p.avg_health, p.min_health, p.degradation_span, p.cycles as f64])
        .collect();
    let k = config.max_clusters.min(profiles.len());
    let fit = kmeans::fit(&features, k, config);

    debug!(
        engines = profiles.len(),
        k,
        iterations = fit.iterations,
        inertia = fit.inertia,
        "Engines clustered"
    );

    for (profile, label) in profiles.iter_mut().zip(fit.labels) {
        profile.cluster = label;
    }
    profiles
}
