//! Classifier Backends

use crate::InferenceError;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tracing::{debug, info};

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A fitted classifier: one integer class code per scaled input row
pub trait Classifier: Send + Sync {
    fn predict(&self, scaled: &Array2<f64>) -> Result<Vec<i64>, InferenceError>;

    /// Short description for health output
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// ONNX classifier executed with tract.
///
/// The exported graph takes `f32[1, n_features]`; rows are run one at a
/// time. The first output is either an `i64` label tensor (sklearn-onnx and
/// onnxmltools exports) or an `f32` score tensor, in which case the argmax wins.
pub struct OnnxClassifier {
    plan: TractModel,
    n_features: usize,
    path: PathBuf,
}

impl OnnxClassifier {
    /// Load and optimize an ONNX model from disk
    pub fn load(path: &Path, n_features: usize) -> Result<Self, InferenceError> {
        info!("Loading ONNX classifier from {}", path.display());
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, n_features]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {e:#}", path.display())))?;

        Ok(Self {
            plan,
            n_features,
            path: path.to_path_buf(),
        })
    }

    fn run_row(&self, row: Vec<f32>) -> Result<i64, InferenceError> {
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), row)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(format!("{e:#}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;

        if let Ok(labels) = first.to_array_view::<i64>() {
            return labels
                .iter()
                .next()
                .copied()
                .ok_or_else(|| InferenceError::InferenceFailed("empty label output".to_string()));
        }

        let scores = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(format!("unsupported output tensor: {e:#}")))?;
        scores
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
                Some((_, b)) if b >= *s => best,
                _ => Some((i, *s)),
            })
            .map(|(i, _)| i as i64)
            .ok_or_else(|| InferenceError::InferenceFailed("empty score output".to_string()))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, scaled: &Array2<f64>) -> Result<Vec<i64>, InferenceError> {
        if scaled.ncols() != self.n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[_, {}]", self.n_features),
                actual: format!("[{}, {}]", scaled.nrows(), scaled.ncols()),
            });
        }

        let codes = scaled
            .rows()
            .into_iter()
            .map(|row| self.run_row(row.iter().map(|v| *v as f32).collect()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("ONNX classifier scored {} rows", codes.len());
        Ok(codes)
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.path.display())
    }
}
