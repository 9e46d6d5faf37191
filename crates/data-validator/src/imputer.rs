//! Batch-Relative Missing-Value Imputation
//!
//! Empty, unparseable, or NaN cells in a base column are replaced by that
//! column's mean over the *current upload*. The fill value is therefore
//! batch-relative: an identical row can receive different imputed values in
//! two uploads whose other rows differ.

use crate::error::ValidationError;
use crate::schema::{BaseColumn, SensorRow, TIMESTAMP_COLUMN};
use crate::table::RawTable;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

/// Start of the synthetic hourly sequence (2024-01-01T00:00:00 UTC)
pub const SYNTHETIC_EPOCH: i64 = 1_704_067_200;

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Per-column fill statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationReport {
    /// Cells filled, per base column (canonical order)
    pub filled: Vec<(BaseColumn, usize)>,
    /// Batch mean used as fill value; `None` when the column had no usable cell
    pub means: Vec<(BaseColumn, Option<f64>)>,
}

impl ImputationReport {
    pub fn total_filled(&self) -> usize {
        self.filled.iter().map(|(_, n)| n).sum()
    }
}

/// Imputed rows ready for feature engineering
#[derive(Debug, Clone)]
pub struct SensorBatch {
    pub rows: Vec<SensorRow>,
    pub report: ImputationReport,
    /// True when the upload had no timestamp column
    pub synthetic_timestamps: bool,
}

impl SensorBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fills missing base values with the batch column mean
#[derive(Debug, Clone, Default)]
pub struct Imputer;

impl Imputer {
    pub fn new() -> Self {
        Self
    }

    /// Convert a validated table to sensor rows.
    ///
    /// A column whose cells are all unusable has no mean and its cells stay
    /// NaN; the feature engineer's non-finite fallback zeroes them later.
    pub fn impute(&self, table: &RawTable) -> Result<SensorBatch, ValidationError> {
        if table.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let mut indices = Vec::with_capacity(BaseColumn::ALL.len());
        let mut absent = Vec::new();
        for column in BaseColumn::ALL {
            match table.column_index(column.name()) {
                Some(idx) => indices.push((column, idx)),
                None => absent.push(column.name().to_string()),
            }
        }
        if !absent.is_empty() {
            absent.sort();
            return Err(ValidationError::MissingColumns(absent));
        }

        let timestamp_idx = table.column_index(TIMESTAMP_COLUMN);
        let mut rows: Vec<SensorRow> = (0..table.len())
            .map(|i| SensorRow {
                timestamp: match timestamp_idx {
                    Some(idx) => table.cell(i, idx).and_then(parse_timestamp),
                    None => synthetic_timestamp(i),
                },
                ..Default::default()
            })
            .collect();

        let mut report = ImputationReport::default();
        for (column, idx) in indices {
            let parsed: Vec<Option<f64>> = (0..table.len())
                .map(|i| table.cell(i, idx).and_then(parse_value))
                .collect();

            let present: Vec<f64> = parsed.iter().flatten().copied().collect();
            let mean = if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            };

            let mut filled = 0;
            for (row, value) in rows.iter_mut().zip(&parsed) {
                let value = match value {
                    Some(v) => *v,
                    None => {
                        filled += 1;
                        mean.unwrap_or(f64::NAN)
                    }
                };
                row.set(column, value);
            }

            if filled > 0 {
                match mean {
                    Some(m) => debug!("Imputed {} cells of {} with batch mean {}", filled, column.name(), m),
                    None => warn!("Column {} has no usable values; {} cells left undefined", column.name(), filled),
                }
            }
            report.filled.push((column, filled));
            report.means.push((column, mean));
        }

        if timestamp_idx.is_some() {
            let unparsed = rows.iter().filter(|r| r.timestamp.is_none()).count();
            if unparsed > 0 {
                warn!("{} rows have an unparseable timestamp", unparsed);
            }
        }

        Ok(SensorBatch {
            rows,
            report,
            synthetic_timestamps: timestamp_idx.is_none(),
        })
    }
}

/// Numeric cell value; empty, unparseable, and NaN cells count as missing
fn parse_value(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse an ISO-8601 style timestamp
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    if cell.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Row `index` of the hourly sequence starting at [`SYNTHETIC_EPOCH`]
pub fn synthetic_timestamp(index: usize) -> Option<NaiveDateTime> {
    let offset = i64::try_from(index).ok()?.checked_mul(3600)?;
    DateTime::from_timestamp(SYNTHETIC_EPOCH.checked_add(offset)?, 0).map(|dt| dt.naive_utc())
}
