//! Prediction Aggregation

use chrono::NaiveDateTime;
use feature_engine::FeatureRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// One row of the trend table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(rename = "Timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Fault_Type")]
    pub fault_type: String,
    #[serde(rename = "Rotational_Speed_RPM")]
    pub rotational_speed_rpm: f64,
    #[serde(rename = "Torque_Nm")]
    pub torque_nm: f64,
    #[serde(rename = "Vibration_X_mm_s")]
    pub vibration_x_mm_s: f64,
    #[serde(rename = "Vibration_Y_mm_s")]
    pub vibration_y_mm_s: f64,
    #[serde(rename = "Vibration_Z_mm_s")]
    pub vibration_z_mm_s: f64,
    #[serde(rename = "Temperature_C")]
    pub temperature_c: f64,
    #[serde(rename = "Pressure_bar")]
    pub pressure_bar: f64,
    #[serde(rename = "Flow_Rate_LPM")]
    pub flow_rate_lpm: f64,
}

/// Batch-level view of a labelled upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub total_records: usize,
    /// Distinct labels, first-seen order
    pub unique_faults: Vec<String>,
    pub summary: BTreeMap<String, usize>,
    /// Upload order; rows without a timestamp are dropped
    pub trend: Vec<TrendPoint>,
}

impl PredictionSummary {
    /// Earliest and latest trend timestamp
    pub fn window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.trend.first()?.timestamp;
        Some(self.trend.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(p.timestamp), hi.max(p.timestamp))
        }))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Aggregator;

impl Aggregator {
    /// Summarize rows with their labels; `labels` is parallel to `rows`
    pub fn summarize(&self, rows: &[FeatureRow], labels: &[String]) -> PredictionSummary {
        let mut summary = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut unique_faults = Vec::new();
        for label in labels {
            *summary.entry(label.clone()).or_insert(0) += 1;
            if seen.insert(label.as_str()) {
                unique_faults.push(label.clone());
            }
        }

        let trend: Vec<TrendPoint> = rows
            .iter()
            .zip(labels)
            .filter_map(|(row, label)| {
                let s = &row.sensor;
                Some(TrendPoint {
                    timestamp: s.timestamp?,
                    fault_type: label.clone(),
                    rotational_speed_rpm: s.rotational_speed_rpm,
                    torque_nm: s.torque_nm,
                    vibration_x_mm_s: s.vibration_x_mm_s,
                    vibration_y_mm_s: s.vibration_y_mm_s,
                    vibration_z_mm_s: s.vibration_z_mm_s,
                    temperature_c: s.temperature_c,
                    pressure_bar: s.pressure_bar,
                    flow_rate_lpm: s.flow_rate_lpm,
                })
            })
            .collect();

        let dropped = labels.len().min(rows.len()) - trend.len();
        if dropped > 0 {
            warn!("{} rows without a usable timestamp left out of the trend", dropped);
        }

        PredictionSummary {
            total_records: labels.len(),
            unique_faults,
            summary,
            trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_validator::SensorRow;

    fn row(hour: Option<u32>) -> FeatureRow {
        let sensor = SensorRow {
            timestamp: hour.map(|h| {
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap()
            }),
            temperature_c: 70.0,
            ..Default::default()
        };
        FeatureRow {
            sensor,
            ..Default::default()
        }
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_and_first_seen_order() {
        let rows: Vec<_> = (0..4).map(|h| row(Some(h))).collect();
        let s = Aggregator.summarize(&rows, &labels(&["Normal", "Imbalance", "Normal", "Cavitation"]));
        assert_eq!(s.total_records, 4);
        assert_eq!(s.unique_faults, vec!["Normal", "Imbalance", "Cavitation"]);
        assert_eq!(s.summary["Normal"], 2);
        assert_eq!(s.summary["Imbalance"], 1);
        assert_eq!(s.trend.len(), 4);
    }

    #[test]
    fn test_trend_drops_rows_without_timestamp() {
        let rows = vec![row(Some(5)), row(None), row(Some(2))];
        let s = Aggregator.summarize(&rows, &labels(&["Normal", "Normal", "Imbalance"]));
        assert_eq!(s.total_records, 3);
        assert_eq!(s.trend.len(), 2);
        assert_eq!(s.trend[1].fault_type, "Imbalance");

        let (start, end) = s.window().unwrap();
        assert_eq!(start, s.trend[1].timestamp);
        assert_eq!(end, s.trend[0].timestamp);
    }

    #[test]
    fn test_trend_point_field_names() {
        let s = Aggregator.summarize(&[row(Some(1))], &labels(&["Normal"]));
        let json = serde_json::to_value(&s.trend[0]).unwrap();
        assert_eq!(json["Fault_Type"], "Normal");
        assert_eq!(json["Temperature_C"], 70.0);
        assert!(json.get("Timestamp").is_some());
    }

    #[test]
    fn test_empty_window() {
        let s = Aggregator.summarize(&[row(None)], &labels(&["Normal"]));
        assert!(s.window().is_none());
    }
}
