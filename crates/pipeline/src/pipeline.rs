//! Stage Composition

use crate::aggregator::{Aggregator, PredictionSummary};
use crate::annotate::write_annotated;
use crate::maintenance::{plan_maintenance, MaintenanceTask};
use crate::PipelineError;
use data_validator::{Imputer, RawTable, SchemaValidator, SensorBatch};
use fallback::RuleOverrideEngine;
use feature_engine::{FeatureEngineer, FeatureMatrix, FeatureTable};
use inference_engine::FaultClassifier;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a labelled upload produced
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub raw: RawTable,
    pub features: FeatureTable,
    pub labels: Vec<String>,
    pub summary: PredictionSummary,
    pub maintenance: Vec<MaintenanceTask>,
    pub synthetic_timestamps: bool,
    /// Rows labelled by a threshold rule instead of the classifier
    pub overridden_rows: usize,
    pub model_invoked: bool,
}

impl PredictionOutcome {
    /// The upload as CSV with derived features and `Fault_Type` added
    pub fn annotated_csv(&self) -> Result<Vec<u8>, PipelineError> {
        write_annotated(&self.raw, &self.features.rows, &self.labels, self.synthetic_timestamps)
    }
}

/// Validation → imputation → features → matrix → labels → aggregation
pub struct PredictionPipeline {
    validator: SchemaValidator,
    imputer: Imputer,
    engineer: FeatureEngineer,
    aggregator: Aggregator,
    production: Arc<dyn FaultClassifier>,
    simulator: Arc<dyn FaultClassifier>,
    overrides: RuleOverrideEngine,
}

impl PredictionPipeline {
    pub fn new(
        production: Arc<dyn FaultClassifier>,
        simulator: Arc<dyn FaultClassifier>,
        overrides: RuleOverrideEngine,
    ) -> Self {
        info!(
            "Pipeline ready: production={} simulator={} override_policy={:?}",
            production.name(),
            simulator.name(),
            overrides.policy()
        );
        Self {
            validator: SchemaValidator::default(),
            imputer: Imputer::new(),
            engineer: FeatureEngineer::default(),
            aggregator: Aggregator,
            production,
            simulator,
            overrides,
        }
    }

    pub fn production(&self) -> &dyn FaultClassifier {
        self.production.as_ref()
    }

    pub fn simulator(&self) -> &dyn FaultClassifier {
        self.simulator.as_ref()
    }

    pub fn overrides(&self) -> &RuleOverrideEngine {
        &self.overrides
    }

    /// Parse and check an upload without labelling it
    pub fn validate(&self, bytes: &[u8]) -> Result<RawTable, PipelineError> {
        let raw = RawTable::from_bytes(bytes)?;
        self.validator.validate(&raw)?;
        Ok(raw)
    }

    /// Production path: every row labelled by the production bundle
    pub fn predict(&self, bytes: &[u8]) -> Result<PredictionOutcome, PipelineError> {
        let result = self.run_production(bytes);
        record("predict", &result);
        result
    }

    /// Simulator path: row rules first, simulator bundle as fallback
    pub fn simulate(&self, bytes: &[u8]) -> Result<PredictionOutcome, PipelineError> {
        let result = self.run_simulator(bytes);
        record("simulate", &result);
        result
    }

    fn prepare(&self, bytes: &[u8]) -> Result<(RawTable, SensorBatch, FeatureTable), PipelineError> {
        let raw = self.validate(bytes)?;
        let batch = self.imputer.impute(&raw)?;
        if batch.report.total_filled() > 0 {
            counter!("pump_imputed_cells_total").increment(batch.report.total_filled() as u64);
        }
        let features = self.engineer.engineer(&batch);
        debug!("Prepared {} rows ({} columns in upload)", features.len(), raw.headers().len());
        Ok((raw, batch, features))
    }

    fn run_production(&self, bytes: &[u8]) -> Result<PredictionOutcome, PipelineError> {
        let start = Instant::now();
        let (raw, batch, features) = self.prepare(bytes)?;
        let matrix = FeatureMatrix::assemble(&features, self.production.required_features())?;
        let labels = self.production.classify(&matrix)?;

        let outcome = self.finish(raw, batch, features, labels, 0, true);
        info!(
            "{} bundle labelled {} rows in {}ms",
            self.production.name(),
            outcome.summary.total_records,
            start.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn run_simulator(&self, bytes: &[u8]) -> Result<PredictionOutcome, PipelineError> {
        let start = Instant::now();
        let (raw, batch, features) = self.prepare(bytes)?;
        let matrix = FeatureMatrix::assemble(&features, self.simulator.required_features())?;
        let applied = self
            .overrides
            .apply(&features.rows, || self.simulator.classify(&matrix))?;

        if applied.overridden_rows > 0 {
            counter!("pump_rule_overrides_total").increment(applied.overridden_rows as u64);
        }
        let outcome = self.finish(
            raw,
            batch,
            features,
            applied.labels,
            applied.overridden_rows,
            applied.model_invoked,
        );
        info!(
            "Simulated {} rows in {}ms ({} overridden, model invoked: {})",
            outcome.summary.total_records,
            start.elapsed().as_millis(),
            outcome.overridden_rows,
            outcome.model_invoked
        );
        Ok(outcome)
    }

    fn finish(
        &self,
        raw: RawTable,
        batch: SensorBatch,
        features: FeatureTable,
        labels: Vec<String>,
        overridden_rows: usize,
        model_invoked: bool,
    ) -> PredictionOutcome {
        let summary = self.aggregator.summarize(&features.rows, &labels);
        let maintenance = plan_maintenance(&summary.summary);
        PredictionOutcome {
            raw,
            features,
            labels,
            summary,
            maintenance,
            synthetic_timestamps: batch.synthetic_timestamps,
            overridden_rows,
            model_invoked,
        }
    }
}

fn record(path: &'static str, result: &Result<PredictionOutcome, PipelineError>) {
    match result {
        Ok(outcome) => {
            counter!("pump_predictions_total", "path" => path).increment(1);
            histogram!("pump_batch_rows").record(outcome.summary.total_records as f64);
        }
        Err(e) => {
            warn!("{} failed: {}", path, e);
            counter!("pump_prediction_errors_total", "kind" => e.kind().as_str()).increment(1);
        }
    }
}
