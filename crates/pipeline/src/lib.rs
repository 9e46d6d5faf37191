//! Fault Prediction Pipeline
//!
//! Raw CSV → schema check → imputation → feature engineering → matrix
//! assembly → inference (or rule override) → aggregation.

mod aggregator;
mod annotate;
mod maintenance;
mod pipeline;

pub use aggregator::{Aggregator, PredictionSummary, TrendPoint};
pub use annotate::write_annotated;
pub use maintenance::{plan_maintenance, recommended_action, MaintenanceTask, Priority};
pub use pipeline::{PredictionOutcome, PredictionPipeline};

use data_validator::ValidationError;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy surfaced at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingColumns,
    MissingFeatures,
    InvalidFormat,
    ModelInvocation,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingColumns => "missing_columns",
            ErrorKind::MissingFeatures => "missing_features",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::ModelInvocation => "model_invocation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors from any pipeline stage; no partial output accompanies them
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
    #[error("Missing features required by model: {0:?}")]
    MissingFeatures(Vec<String>),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),
    #[error("Failed to write annotated output: {0}")]
    Output(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingColumns(_) => ErrorKind::MissingColumns,
            PipelineError::MissingFeatures(_) => ErrorKind::MissingFeatures,
            PipelineError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            PipelineError::ModelInvocation(_) => ErrorKind::ModelInvocation,
            PipelineError::Output(_) => ErrorKind::Internal,
        }
    }

    /// Column or feature names behind a Missing* error
    pub fn missing(&self) -> Option<&[String]> {
        match self {
            PipelineError::MissingColumns(names) | PipelineError::MissingFeatures(names) => Some(names),
            _ => None,
        }
    }
}

impl From<ValidationError> for PipelineError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MissingColumns(names) => PipelineError::MissingColumns(names),
            ValidationError::InvalidFormat(msg) => PipelineError::InvalidFormat(msg),
            ValidationError::EmptyBatch => PipelineError::InvalidFormat(e.to_string()),
        }
    }
}

impl From<FeatureError> for PipelineError {
    fn from(e: FeatureError) -> Self {
        match e {
            FeatureError::MissingFeatures(names) => PipelineError::MissingFeatures(names),
            FeatureError::Shape(msg) => PipelineError::ModelInvocation(msg),
        }
    }
}

impl From<InferenceError> for PipelineError {
    fn from(e: InferenceError) -> Self {
        PipelineError::ModelInvocation(e.to_string())
    }
}
