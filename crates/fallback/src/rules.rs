//! Threshold Rules and Override Policy

use data_validator::{BaseColumn, SensorRow};
use feature_engine::FeatureRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Joins matched labels into one Fault_Type value
pub const LABEL_SEPARATOR: &str = ", ";

/// Threshold comparison on one or more base columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// value > threshold
    Above { column: BaseColumn, threshold: f64 },
    /// value < threshold
    Below { column: BaseColumn, threshold: f64 },
    /// any listed value > threshold
    AnyAbove { columns: Vec<BaseColumn>, threshold: f64 },
}

impl Condition {
    pub fn matches(&self, row: &SensorRow) -> bool {
        match self {
            Condition::Above { column, threshold } => row.get(*column) > *threshold,
            Condition::Below { column, threshold } => row.get(*column) < *threshold,
            Condition::AnyAbove { columns, threshold } => columns.iter().any(|c| row.get(*c) > *threshold),
        }
    }
}

/// A condition and the label it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub condition: Condition,
    pub label: String,
}

impl ThresholdRule {
    pub fn new(condition: Condition, label: &str) -> Self {
        Self {
            condition,
            label: label.to_string(),
        }
    }

    /// The fixed simulator rule set
    pub fn defaults() -> Vec<ThresholdRule> {
        vec![
            ThresholdRule::new(Condition::Above { column: BaseColumn::Temperature, threshold: 80.0 }, "Cavitation"),
            ThresholdRule::new(
                Condition::AnyAbove {
                    columns: vec![BaseColumn::VibrationX, BaseColumn::VibrationY, BaseColumn::VibrationZ],
                    threshold: 3.5,
                },
                "Imbalance",
            ),
            ThresholdRule::new(Condition::Above { column: BaseColumn::Pressure, threshold: 8.0 }, "Misalignment"),
            ThresholdRule::new(Condition::Above { column: BaseColumn::Torque, threshold: 60.0 }, "Bearing Fault"),
            ThresholdRule::new(
                Condition::Above { column: BaseColumn::RotationalSpeed, threshold: 1800.0 },
                "Misalignment",
            ),
            ThresholdRule::new(Condition::Below { column: BaseColumn::FlowRate, threshold: 150.0 }, "Cavitation"),
        ]
    }
}

/// Which rows the rules are evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Evaluate row 0 only; a match labels the whole batch with one value
    #[default]
    PerBatch,
    /// Evaluate each row on its own
    PerRow,
}

/// Labels produced by [`RuleOverrideEngine::apply`]
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideOutcome {
    pub labels: Vec<String>,
    /// Rows whose label came from the rules
    pub overridden_rows: usize,
    /// Whether the fallback classifier ran
    pub model_invoked: bool,
}

/// Evaluates threshold rules and defers to a classifier when none fire
#[derive(Debug, Clone)]
pub struct RuleOverrideEngine {
    rules: Vec<ThresholdRule>,
    policy: OverridePolicy,
}

impl RuleOverrideEngine {
    pub fn new(rules: Vec<ThresholdRule>, policy: OverridePolicy) -> Self {
        info!("Rule override engine: {} rules, policy {:?}", rules.len(), policy);
        Self { rules, policy }
    }

    pub fn with_policy(policy: OverridePolicy) -> Self {
        Self::new(ThresholdRule::defaults(), policy)
    }

    pub fn policy(&self) -> OverridePolicy {
        self.policy
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Labels of every matching rule, in rule order; all rules are evaluated
    pub fn matched_labels<'a>(&'a self, row: &SensorRow) -> Vec<&'a str> {
        self.rules
            .iter()
            .filter(|rule| rule.condition.matches(row))
            .map(|rule| rule.label.as_str())
            .collect()
    }

    /// Sorted, de-duplicated matches joined with [`LABEL_SEPARATOR`]
    pub fn combined_label(&self, row: &SensorRow) -> Option<String> {
        let matched: BTreeSet<&str> = self.matched_labels(row).into_iter().collect();
        if matched.is_empty() {
            None
        } else {
            Some(matched.into_iter().collect::<Vec<_>>().join(LABEL_SEPARATOR))
        }
    }

    /// Label a batch. `classify` labels the full batch, one label per row, and
    /// is only called when at least one row is left unlabelled by the rules.
    pub fn apply<F, E>(&self, rows: &[FeatureRow], classify: F) -> Result<OverrideOutcome, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        match self.policy {
            OverridePolicy::PerBatch => self.apply_per_batch(rows, classify),
            OverridePolicy::PerRow => self.apply_per_row(rows, classify),
        }
    }

    fn apply_per_batch<F, E>(&self, rows: &[FeatureRow], classify: F) -> Result<OverrideOutcome, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        if let Some(label) = rows.first().and_then(|row| self.combined_label(&row.sensor)) {
            debug!("Row 0 override '{}' applied to {} rows", label, rows.len());
            return Ok(OverrideOutcome {
                labels: vec![label; rows.len()],
                overridden_rows: rows.len(),
                model_invoked: false,
            });
        }

        debug!("No rule matched row 0, deferring to model");
        Ok(OverrideOutcome {
            labels: classify()?,
            overridden_rows: 0,
            model_invoked: true,
        })
    }

    fn apply_per_row<F, E>(&self, rows: &[FeatureRow], classify: F) -> Result<OverrideOutcome, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        let combined: Vec<Option<String>> = rows.iter().map(|row| self.combined_label(&row.sensor)).collect();
        let overridden_rows = combined.iter().filter(|c| c.is_some()).count();

        if overridden_rows == rows.len() && !rows.is_empty() {
            return Ok(OverrideOutcome {
                labels: combined.into_iter().flatten().collect(),
                overridden_rows,
                model_invoked: false,
            });
        }

        let model_labels = classify()?;
        let labels = combined
            .into_iter()
            .zip(model_labels)
            .map(|(rule, model)| rule.unwrap_or(model))
            .collect();

        debug!("{} of {} rows overridden", overridden_rows, rows.len());
        Ok(OverrideOutcome {
            labels,
            overridden_rows,
            model_invoked: true,
        })
    }
}

impl Default for RuleOverrideEngine {
    fn default() -> Self {
        Self::with_policy(OverridePolicy::default())
    }
}
