//! Uploaded table reader.
//!
//! Parses CSV text with a header row into a [`SensorTable`]. Required columns
//! are `engine_id` and `cycle`; every column whose name starts with the sensor
//! prefix becomes a channel, in header order. Any other column (operating
//! settings such as `op_1`) is ignored.
//!
//! ```ignore
//! let table = dataset::parse_csv(&text, "sensor")?;
//! ```

use tracing::debug;

use crate::config::defaults::{CYCLE_COLUMN, ENGINE_ID_COLUMN};
use crate::error::SchemaError;
use crate::types::{SensorRecord, SensorTable};

/// Split a CSV line respecting quoted fields (commas inside quotes, `""`
/// escapes). Fields are trimmed.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Integer cell; integral floats such as `12.0` are accepted.
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    #[allow(clippy::cast_possible_truncation)]
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

fn parse_reading(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse CSV text into a sensor table.
///
/// Fails with [`SchemaError`] when the header lacks `engine_id` / `cycle`, when
/// no sensor column exists, or when a row is ragged or holds an unreadable
/// cell. Row numbers in errors are 1-based data rows (header excluded).
/// Blank lines are skipped.
pub fn parse_csv(text: &str, sensor_prefix: &str) -> Result<SensorTable, SchemaError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}'))
        .filter(|l| !l.trim().is_empty());

    let header = csv_split(lines.next().ok_or(SchemaError::EmptyHeader)?);

    let position = |name: &str| header.iter().position(|h| h == name);
    let (engine_col, cycle_col) = match (position(ENGINE_ID_COLUMN), position(CYCLE_COLUMN)) {
        (Some(e), Some(c)) => (e, c),
        (e, c) => {
            let mut missing = Vec::new();
            if e.is_none() {
                missing.push(ENGINE_ID_COLUMN.to_string());
            }
            if c.is_none() {
                missing.push(CYCLE_COLUMN.to_string());
            }
            return Err(SchemaError::MissingColumns(missing));
        }
    };

    let sensor_cols: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(sensor_prefix))
        .map(|(i, _)| i)
        .collect();
    if sensor_cols.is_empty() {
        return Err(SchemaError::NoSensorChannels {
            prefix: sensor_prefix.to_string(),
        });
    }
    let channels: Vec<String> = sensor_cols.iter().map(|&i| header[i].clone()).collect();

    let mut records = Vec::new();
    for (idx, line) in lines.enumerate() {
        let row = idx + 1;
        let fields = csv_split(line);
        if fields.len() != header.len() {
            return Err(SchemaError::RaggedRow {
                row,
                expected: header.len(),
                found: fields.len(),
            });
        }

        let invalid = |col: usize, kind: &'static str| SchemaError::InvalidValue {
            row,
            column: header[col].clone(),
            value: fields[col].clone(),
            kind,
        };

        let engine_id =
            parse_int(&fields[engine_col]).ok_or_else(|| invalid(engine_col, "integer"))?;
        let cycle = parse_int(&fields[cycle_col]).ok_or_else(|| invalid(cycle_col, "integer"))?;
        let readings = sensor_cols
            .iter()
            .map(|&col| parse_reading(&fields[col]).ok_or_else(|| invalid(col, "number")))
            .collect::<Result<Vec<f64>, _>>()?;

        records.push(SensorRecord {
            engine_id,
            cycle,
            readings,
        });
    }

    debug!(rows = records.len(), channels = channels.len(), "Parsed sensor table");
    SensorTable::new(channels, records)
}
