//! Fault Inference Engine
//!
//! Loads pre-fitted artifact bundles and turns feature matrices into fault
//! labels: scale, predict, decode.

mod bundle;
mod classifier;
mod engine;
mod label;
mod scaler;

pub use bundle::{ArtifactBundle, BundleDescriptor, BundlePaths};
pub use classifier::{Classifier, OnnxClassifier};
pub use engine::{FaultClassifier, InferenceEngine, InferenceResult};
pub use label::LabelEncoder;
pub use scaler::StandardScaler;

use thiserror::Error;

/// Errors during artifact loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inconsistent artifact bundle: {0}")]
    InconsistentBundle(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Feature columns do not match bundle order: expected {expected:?}, got {actual:?}")]
    ColumnOrder { expected: Vec<String>, actual: Vec<String> },
    #[error("y contains previously unseen labels: {0}")]
    UnknownClass(i64),
}
