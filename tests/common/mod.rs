//! Shared fixtures: stub models with hand-checkable outputs and CSV builders.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use degradix::config::DegradixConfig;
use degradix::error::InferenceError;
use degradix::models::{
    InstantHealthModel, MinMaxScaler, PretrainedModels, TemporalHealthModel,
};
use degradix::types::FeatureMatrix;
use degradix::AnalysisPipeline;

/// Window length of the shipped temporal model.
pub const SEQ_LEN: usize = 20;

/// Instant model: mean of the normalized row. Counts invocations.
#[derive(Default)]
pub struct MeanInstant {
    pub n_features: usize,
    pub calls: AtomicUsize,
}

impl InstantHealthModel for MeanInstant {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(x.rows
            .iter()
            .map(|r| r.iter().sum::<f64>() / r.len() as f64)
            .collect())
    }
}

/// Temporal model: the last value of each window. Counts invocations.
#[derive(Default)]
pub struct LastValueTemporal {
    pub seq_len: usize,
    pub calls: AtomicUsize,
}

impl TemporalHealthModel for LastValueTemporal {
    fn window_len(&self) -> usize {
        self.seq_len
    }

    fn predict(&self, windows: &[&[f64]]) -> Result<Vec<f64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(windows.iter().map(|w| w[w.len() - 1]).collect())
    }
}

/// Instant model returning `value` for every row, with a configurable
/// declared width. `NAN` makes it emit non-finite output.
pub struct ConstInstant {
    pub n_features: usize,
    pub value: f64,
}

impl InstantHealthModel for ConstInstant {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        Ok(vec![self.value; x.rows.len()])
    }
}

/// Instant model that drops the last row's prediction.
pub struct ShortInstant;

impl InstantHealthModel for ShortInstant {
    fn n_features(&self) -> usize {
        1
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        Ok(vec![0.5; x.rows.len().saturating_sub(1)])
    }
}

/// Instant model that blocks for `delay` before answering.
pub struct SlowInstant {
    pub delay: Duration,
}

impl InstantHealthModel for SlowInstant {
    fn n_features(&self) -> usize {
        1
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        std::thread::sleep(self.delay);
        Ok(vec![0.5; x.rows.len()])
    }
}

/// Temporal model returning `value` for every window.
pub struct ConstTemporal {
    pub seq_len: usize,
    pub value: f64,
}

impl TemporalHealthModel for ConstTemporal {
    fn window_len(&self) -> usize {
        self.seq_len
    }

    fn predict(&self, windows: &[&[f64]]) -> Result<Vec<f64>, InferenceError> {
        Ok(vec![self.value; windows.len()])
    }
}

/// Pipeline over the single-channel `[76, 100]` scaler with the given models.
pub fn pipeline_from(
    instant: Arc<dyn InstantHealthModel>,
    temporal: Arc<dyn TemporalHealthModel>,
    config: &DegradixConfig,
) -> AnalysisPipeline {
    let scaler = MinMaxScaler::new(vec!["sensor_1".into()], vec![76.0], vec![100.0]);
    AnalysisPipeline::new(PretrainedModels::new(Arc::new(scaler), instant, temporal), config)
}

/// Well-behaved temporal stub over the shipped window length.
pub fn last_value_temporal() -> Arc<dyn TemporalHealthModel> {
    Arc::new(LastValueTemporal {
        seq_len: SEQ_LEN,
        calls: AtomicUsize::new(0),
    })
}

/// Stub models plus handles for inspecting invocation counts.
pub struct StubModels {
    pub models: PretrainedModels,
    pub instant: Arc<MeanInstant>,
    pub temporal: Arc<LastValueTemporal>,
}

/// Scaler over `sensor_1..=sensor_n`, every channel fit on `[lo, hi]`.
pub fn stub_models(n_channels: usize, lo: f64, hi: f64, seq_len: usize) -> StubModels {
    let channels: Vec<String> = (1..=n_channels).map(|i| format!("sensor_{i}")).collect();
    let scaler = MinMaxScaler::new(channels, vec![lo; n_channels], vec![hi; n_channels]);
    let instant = Arc::new(MeanInstant {
        n_features: n_channels,
        calls: AtomicUsize::new(0),
    });
    let temporal = Arc::new(LastValueTemporal {
        seq_len,
        calls: AtomicUsize::new(0),
    });
    StubModels {
        models: PretrainedModels::new(Arc::new(scaler), instant.clone(), temporal.clone()),
        instant,
        temporal,
    }
}

/// Single-channel pipeline fit on `[76, 100]` with the default config.
pub fn stub_pipeline() -> (AnalysisPipeline, StubModels) {
    stub_pipeline_with(&DegradixConfig::default())
}

pub fn stub_pipeline_with(config: &DegradixConfig) -> (AnalysisPipeline, StubModels) {
    let stubs = stub_models(1, 76.0, 100.0, SEQ_LEN);
    (AnalysisPipeline::new(stubs.models.clone(), config), stubs)
}

/// CSV with one sensor column from `(engine_id, cycle, sensor_1)` rows.
pub fn csv(rows: &[(i64, i64, f64)]) -> String {
    let mut out = String::from("engine_id,cycle,op_1,sensor_1\n");
    for (engine_id, cycle, value) in rows {
        let _ = writeln!(out, "{engine_id},{cycle},0.5,{value}");
    }
    out
}

/// One engine whose sensor falls by one unit per cycle from 100.
pub fn declining_engine(engine_id: i64, cycles: i64) -> Vec<(i64, i64, f64)> {
    (0..cycles)
        .map(|i| (engine_id, i + 1, 100.0 - i as f64))
        .collect()
}
