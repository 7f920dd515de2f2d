//! Pipeline Regression Tests
//!
//! Runs the full analytics pipeline (CSV -> health -> DSI / reliability /
//! clusters / insights) over stub models whose outputs can be checked by hand:
//! the scaler maps sensor 100 -> 1.0 and 76 -> 0.0, the instant model returns
//! the normalized value, and the temporal model returns the last value of each
//! window.

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{
    csv, declining_engine, last_value_temporal, pipeline_from, stub_pipeline, stub_pipeline_with,
    ConstInstant, ConstTemporal, ShortInstant, SEQ_LEN,
};
use degradix::config::{DegradixConfig, WindowingMode};
use degradix::dataset::parse_csv;
use degradix::error::{InferenceError, PipelineError, SchemaError};
use degradix::types::{DegradationPace, SensorTable};

fn table(rows: &[(i64, i64, f64)]) -> SensorTable {
    parse_csv(&csv(rows), "sensor").unwrap()
}

/// Normalized sensor for cycle index `i` of a declining engine.
fn norm(i: usize) -> f64 {
    (24.0 - i as f64) / 24.0
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn single_engine_25_cycles() {
    let (pipeline, stubs) = stub_pipeline();
    let t = table(&declining_engine(1, 25));
    let report = pipeline.analyze(&t).unwrap();

    assert_eq!(report.health.len(), 25);
    assert!(report.health.iter().all(|p| (0.0..=1.0).contains(&p.health)));

    // Positions 0..=20 see the first prediction (window 0 ends at index 19)
    let expected_first = 0.6 * norm(0) + 0.4 * norm(19);
    assert!((report.health[0].health - expected_first).abs() < 1e-12);
    let expected_last = 0.6 * norm(24) + 0.4 * norm(23);
    assert!((report.health[24].health - expected_last).abs() < 1e-12);

    assert_eq!(report.dsi.len(), 25);
    assert_eq!(report.dsi[0].dsi, 0.0);
    assert!(report.dsi.iter().all(|p| p.dsi >= 0.0));

    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].engine_id, 1);
    assert_eq!(report.clusters[0].cycles, 25);
    assert_eq!(report.clusters[0].cluster, 0);

    assert_eq!(stubs.temporal.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn fewer_rows_than_window_skip_temporal_model() {
    let (pipeline, stubs) = stub_pipeline();
    let t = table(&declining_engine(1, 10));
    let estimate = pipeline.estimate(&t).unwrap();

    assert_eq!(estimate.temporal, estimate.instant);
    assert_eq!(stubs.temporal.calls.load(Ordering::SeqCst), 0);
    for (h, i) in estimate.health.iter().zip(&estimate.instant) {
        assert!((h - i.clamp(0.0, 1.0)).abs() < 1e-12);
    }
}

#[test]
fn exactly_window_length_rows_skip_temporal_model() {
    let (pipeline, stubs) = stub_pipeline();
    let t = table(&declining_engine(1, SEQ_LEN as i64));
    let estimate = pipeline.estimate(&t).unwrap();

    assert_eq!(estimate.temporal, estimate.instant);
    assert_eq!(stubs.temporal.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn backfill_repeats_first_prediction() {
    let (pipeline, _stubs) = stub_pipeline();
    let t = table(&declining_engine(1, 30));
    let estimate = pipeline.estimate(&t).unwrap();

    let first_prediction = estimate.temporal[SEQ_LEN];
    assert!((first_prediction - norm(SEQ_LEN - 1)).abs() < 1e-12);
    assert!(estimate.temporal[..SEQ_LEN]
        .iter()
        .all(|&v| v == first_prediction));
    // Backfill never copies instant values
    assert_ne!(estimate.temporal[0], estimate.instant[0]);
}

#[test]
fn missing_engine_id_is_schema_error() {
    let err = parse_csv("cycle,sensor_1\n1,90\n", "sensor").unwrap_err();
    assert_eq!(err, SchemaError::MissingColumns(vec!["engine_id".into()]));
}

#[test]
fn channel_mismatch_rejected_before_inference() {
    let (pipeline, stubs) = stub_pipeline();
    let t = parse_csv("engine_id,cycle,sensor_2\n1,1,90\n", "sensor").unwrap();

    let err = pipeline.health(&t).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Schema(SchemaError::MissingChannels(vec!["sensor_1".into()]))
    );
    assert_eq!(stubs.instant.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn extra_channels_follow_config() {
    let text = "engine_id,cycle,sensor_1,sensor_9\n1,1,90,3\n1,2,88,3\n";
    let t = parse_csv(text, "sensor").unwrap();

    let (strict, _) = stub_pipeline();
    assert!(matches!(
        strict.health(&t).unwrap_err(),
        PipelineError::Schema(SchemaError::UnexpectedChannels(_))
    ));

    let mut config = DegradixConfig::default();
    config.pipeline.allow_extra_channels = true;
    let (lenient, _) = stub_pipeline_with(&config);
    assert_eq!(lenient.health(&t).unwrap().len(), 2);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn identical_input_gives_bit_identical_output() {
    let (pipeline, _stubs) = stub_pipeline();
    let mut rows = declining_engine(1, 30);
    rows.extend(declining_engine(2, 22));
    rows.extend(declining_engine(3, 5));
    let t = table(&rows);

    let a = pipeline.analyze(&t).unwrap();
    let b = pipeline.analyze(&t).unwrap();

    let bits = |v: Vec<f64>| v.into_iter().map(f64::to_bits).collect::<Vec<_>>();
    assert_eq!(
        bits(a.health.iter().map(|p| p.health).collect()),
        bits(b.health.iter().map(|p| p.health).collect())
    );
    assert_eq!(
        bits(a.dsi.iter().map(|p| p.dsi).collect()),
        bits(b.dsi.iter().map(|p| p.dsi).collect())
    );
    assert_eq!(
        bits(a.reliability.iter().map(|p| p.reliability).collect()),
        bits(b.reliability.iter().map(|p| p.reliability).collect())
    );
    assert_eq!(a.clusters, b.clusters);
}

#[test]
fn dsi_is_negated_difference_within_engine() {
    let (pipeline, _stubs) = stub_pipeline();
    // Interleave two engines in upload order
    let mut rows = Vec::new();
    for (a, b) in declining_engine(1, 8).into_iter().zip(declining_engine(2, 8)) {
        rows.push(b);
        rows.push(a);
    }
    let t = table(&rows);
    let report = pipeline.analyze(&t).unwrap();

    let health: HashMap<(i64, i64), f64> = report
        .health
        .iter()
        .map(|p| ((p.engine_id, p.cycle), p.health))
        .collect();

    let mut prev: Option<(i64, i64)> = None;
    for p in &report.dsi {
        match prev {
            Some((engine_id, cycle)) if engine_id == p.engine_id => {
                let expected = health[&(engine_id, cycle)] - health[&(p.engine_id, p.cycle)];
                assert!((p.dsi - expected).abs() < 1e-12);
            }
            _ => assert_eq!(p.dsi, 0.0, "first cycle of engine {}", p.engine_id),
        }
        prev = Some((p.engine_id, p.cycle));
    }

    // Health keeps upload order, DSI is sorted
    assert_eq!(report.health[0].engine_id, 2);
    assert_eq!(report.dsi[0].engine_id, 1);
}

#[test]
fn reliability_bounded_and_monotone_in_health() {
    let (pipeline, _stubs) = stub_pipeline();
    let mut rows = declining_engine(1, 25);
    rows.extend(declining_engine(2, 12));
    let t = table(&rows);

    let health = pipeline.health(&t).unwrap();
    let reliability = pipeline.reliability(&t).unwrap();
    assert_eq!(health.len(), reliability.len());

    let mut pairs: Vec<(f64, f64)> = health
        .iter()
        .zip(&reliability)
        .map(|(h, r)| (h.health, r.reliability))
        .collect();
    assert!(pairs.iter().all(|&(_, r)| r > 0.0 && r <= 1.0));

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    for w in pairs.windows(2) {
        assert!(w[1].1 >= w[0].1);
    }
}

#[test]
fn cluster_count_is_min_of_three_and_engines() {
    let (pipeline, _stubs) = stub_pipeline();

    let two = table(&[(1, 1, 100.0), (2, 1, 80.0)]);
    let clusters = pipeline.clusters(&two).unwrap();
    assert_eq!(clusters.len(), 2);
    assert!(clusters.iter().all(|p| p.cluster < 2));

    let mut rows = Vec::new();
    for engine_id in [9, 4, 7, 1, 5] {
        rows.extend(declining_engine(engine_id, 3 + engine_id * 4));
    }
    let five = table(&rows);
    let clusters = pipeline.clusters(&five).unwrap();
    let ids: Vec<i64> = clusters.iter().map(|p| p.engine_id).collect();
    assert_eq!(ids, vec![1, 4, 5, 7, 9]);
    assert!(clusters.iter().all(|p| p.cluster < 3));
}

#[test]
fn header_only_table_gives_empty_results() {
    let (pipeline, stubs) = stub_pipeline();
    let t = parse_csv("engine_id,cycle,sensor_1\n", "sensor").unwrap();

    let report = pipeline.analyze(&t).unwrap();
    assert!(report.health.is_empty());
    assert!(report.dsi.is_empty());
    assert!(report.reliability.is_empty());
    assert!(report.clusters.is_empty());
    assert_eq!(stubs.instant.calls.load(Ordering::SeqCst), 0);

    let err = pipeline.insights(&t).unwrap_err();
    assert!(matches!(err, PipelineError::DegenerateInput(_)));
}

#[test]
fn per_engine_windowing_isolates_engines() {
    let mut config = DegradixConfig::default();
    config.pipeline.windowing = WindowingMode::PerEngine;
    let (per_engine, _) = stub_pipeline_with(&config);
    let (global, _) = stub_pipeline();

    let mut rows = Vec::new();
    for (a, b) in declining_engine(1, 25).into_iter().zip(declining_engine(2, 25)) {
        rows.push(a);
        rows.push(b);
    }
    let mixed = table(&rows);
    let alone = table(&declining_engine(2, 25));

    let alone_health = global.health(&alone).unwrap();
    let mixed_health: Vec<f64> = per_engine
        .health(&mixed)
        .unwrap()
        .into_iter()
        .filter(|p| p.engine_id == 2)
        .map(|p| p.health)
        .collect();
    for (a, m) in alone_health.iter().zip(&mixed_health) {
        assert_eq!(a.health.to_bits(), m.to_bits());
    }

    let global_mixed: Vec<f64> = global
        .health(&mixed)
        .unwrap()
        .into_iter()
        .filter(|p| p.engine_id == 2)
        .map(|p| p.health)
        .collect();
    assert_ne!(global_mixed, mixed_health);
}

#[test]
fn fleet_insights_rank_engines_and_clusters() {
    let (pipeline, _stubs) = stub_pipeline();
    let mut rows = declining_engine(1, 25);
    rows.extend((1..=25).map(|c| (2, c, 100.0)));
    let t = table(&rows);

    let insights = pipeline.insights(&t).unwrap();
    assert_eq!(insights.worst_engine, 1);
    assert_eq!(insights.fastest_degrader.engine_id, 1);
    assert!(insights.fastest_degrader.avg_dsi > 0.0);
    assert_eq!(insights.machines_healthy, 1);
    assert_eq!(insights.machines_moderate, 0);
    assert_eq!(insights.machines_critical, 1);

    let latest_1 = 0.6 * norm(24) + 0.4 * norm(23);
    assert!((insights.fleet_avg_health - (1.0 + latest_1) / 2.0).abs() < 1e-12);

    assert_eq!(insights.cluster_pace.len(), 2);
    assert_eq!(insights.cluster_pace[0].pace, DegradationPace::Fast);
    assert_eq!(insights.cluster_pace[0].cluster, insights.cluster);
    assert_eq!(insights.cluster_pace[1].pace, DegradationPace::Slow);
}

// ============================================================================
// Model contract violations
// ============================================================================

#[test]
fn non_finite_temporal_output_is_inference_error() {
    let pipeline = pipeline_from(
        Arc::new(ConstInstant {
            n_features: 1,
            value: 0.5,
        }),
        Arc::new(ConstTemporal {
            seq_len: SEQ_LEN,
            value: f64::NAN,
        }),
        &DegradixConfig::default(),
    );
    let err = pipeline.health(&table(&declining_engine(1, 25))).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Inference(InferenceError::NonFinite {
            model: "temporal health model",
            index: 0,
        })
    );
    assert_eq!(err.code(), "INFERENCE_ERROR");
}

#[test]
fn non_finite_instant_output_is_inference_error() {
    let pipeline = pipeline_from(
        Arc::new(ConstInstant {
            n_features: 1,
            value: f64::INFINITY,
        }),
        last_value_temporal(),
        &DegradixConfig::default(),
    );
    // Short upload: the temporal model is skipped, so only the instant check can catch it
    let err = pipeline.analyze(&table(&declining_engine(1, 5))).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Inference(InferenceError::NonFinite { model: "instant health model", .. })
    ));
}

#[test]
fn instant_model_width_mismatch_is_inference_error() {
    let pipeline = pipeline_from(
        Arc::new(ConstInstant {
            n_features: 2,
            value: 0.5,
        }),
        last_value_temporal(),
        &DegradixConfig::default(),
    );
    let err = pipeline.health(&table(&declining_engine(1, 5))).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Inference(InferenceError::FeatureDimension {
            model: "instant health model",
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn short_instant_output_is_inference_error() {
    let pipeline = pipeline_from(
        Arc::new(ShortInstant),
        last_value_temporal(),
        &DegradixConfig::default(),
    );
    let err = pipeline.dsi(&table(&declining_engine(1, 5))).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Inference(InferenceError::OutputLength {
            model: "instant health model",
            expected: 5,
            found: 4,
        })
    );
}
