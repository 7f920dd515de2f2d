//! Request-scoped input records: the uploaded sensor table and the feature
//! matrix derived from it.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// One row of the uploaded table: an engine at one operating cycle.
///
/// `readings` is aligned with the owning [`SensorTable`]'s channel list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub engine_id: i64,
    pub cycle: i64,
    pub readings: Vec<f64>,
}

/// Uploaded dataset: named sensor channels plus one record per row, in upload
/// order. `(engine_id, cycle)` duplicates are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorTable {
    channels: Vec<String>,
    records: Vec<SensorRecord>,
}

impl SensorTable {
    /// Build a table, checking that at least one channel exists and that every
    /// record carries one reading per channel.
    pub fn new(channels: Vec<String>, records: Vec<SensorRecord>) -> Result<Self, SchemaError> {
        if channels.is_empty() {
            return Err(SchemaError::NoSensorChannels {
                prefix: crate::config::defaults::SENSOR_PREFIX.to_string(),
            });
        }
        for (row, record) in records.iter().enumerate() {
            if record.readings.len() != channels.len() {
                return Err(SchemaError::RaggedRow {
                    row,
                    expected: channels.len(),
                    found: record.readings.len(),
                });
            }
        }
        Ok(Self { channels, records })
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reading of a named channel for one record.
    pub fn reading(&self, row: usize, channel: &str) -> Option<f64> {
        let col = self.channels.iter().position(|c| c == channel)?;
        self.records.get(row).map(|r| r.readings[col])
    }

    /// Row-major matrix of all sensor readings, columns in table order.
    pub fn feature_matrix(&self) -> FeatureMatrix {
        FeatureMatrix {
            channels: self.channels.clone(),
            rows: self.records.iter().map(|r| r.readings.clone()).collect(),
        }
    }

    /// Row indices in stable `(engine_id, cycle)` order.
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by_key(|&i| (self.records[i].engine_id, self.records[i].cycle));
        order
    }
}

/// Numeric matrix whose columns are named sensor channels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub channels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.channels.len()
    }
}
