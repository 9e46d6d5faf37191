//! Annotated CSV Output

use crate::PipelineError;
use data_validator::{BaseColumn, RawTable, FAULT_TYPE_COLUMN, TIMESTAMP_COLUMN};
use feature_engine::{DerivedFeature, FeatureRow};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where an output column takes its values from
#[derive(Debug, Clone, Copy)]
enum Source {
    Base(BaseColumn),
    Derived(DerivedFeature),
    FaultType,
    SyntheticTimestamp,
    Raw(usize),
}

fn layout(raw: &RawTable, synthetic_timestamps: bool) -> Vec<(String, Source)> {
    let mut columns: Vec<(String, Source)> = raw
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let source = if let Some(c) = BaseColumn::from_name(name) {
                Source::Base(c)
            } else if let Some(f) = DerivedFeature::from_name(name) {
                Source::Derived(f)
            } else if name == FAULT_TYPE_COLUMN {
                Source::FaultType
            } else {
                Source::Raw(idx)
            };
            (name.clone(), source)
        })
        .collect();

    if synthetic_timestamps && !raw.has_column(TIMESTAMP_COLUMN) {
        columns.push((TIMESTAMP_COLUMN.to_string(), Source::SyntheticTimestamp));
    }
    for feature in DerivedFeature::ALL {
        if !raw.has_column(feature.name()) {
            columns.push((feature.name().to_string(), Source::Derived(feature)));
        }
    }
    if !raw.has_column(FAULT_TYPE_COLUMN) {
        columns.push((FAULT_TYPE_COLUMN.to_string(), Source::FaultType));
    }
    columns
}

/// Render the uploaded table with cleaned base values, derived features,
/// and one `Fault_Type` per row.
///
/// Original header order is kept; existing derived or `Fault_Type` columns
/// are overwritten in place and missing ones appended.
pub fn write_annotated(
    raw: &RawTable,
    rows: &[FeatureRow],
    labels: &[String],
    synthetic_timestamps: bool,
) -> Result<Vec<u8>, PipelineError> {
    if rows.len() != raw.len() || labels.len() != raw.len() {
        return Err(PipelineError::Output(format!(
            "{} input rows, {} feature rows, {} labels",
            raw.len(),
            rows.len(),
            labels.len()
        )));
    }

    let columns = layout(raw, synthetic_timestamps);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|(name, _)| name.as_str()))
        .map_err(|e| PipelineError::Output(e.to_string()))?;

    for (i, (row, label)) in rows.iter().zip(labels).enumerate() {
        let record: Vec<String> = columns
            .iter()
            .map(|(_, source)| match *source {
                Source::Base(c) => row.sensor.get(c).to_string(),
                Source::Derived(f) => row.derived(f).to_string(),
                Source::FaultType => label.clone(),
                Source::SyntheticTimestamp => row
                    .sensor
                    .timestamp
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default(),
                Source::Raw(idx) => raw.cell(i, idx).unwrap_or_default().to_string(),
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::Output(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Output(e.to_string()))
}
