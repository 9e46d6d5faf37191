//! Inference Engine Implementation

use crate::bundle::{ArtifactBundle, BundleDescriptor};
use crate::InferenceError;
use feature_engine::FeatureMatrix;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared capability of the production and simulator paths
pub trait FaultClassifier: Send + Sync {
    /// Bundle name
    fn name(&self) -> &str;

    /// Feature names, in the order the matrix must be assembled
    fn required_features(&self) -> &[String];

    /// One fault label per matrix row
    fn classify(&self, matrix: &FeatureMatrix) -> Result<Vec<String>, InferenceError>;

    fn describe(&self) -> BundleDescriptor;
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Decoded fault labels, one per row
    pub labels: Vec<String>,
    /// Raw class codes from the classifier
    pub codes: Vec<i64>,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
}

/// Scales a matrix with the bundle's fitted scaler, predicts, and decodes
pub struct InferenceEngine {
    bundle: Arc<ArtifactBundle>,
    inference_count: AtomicU64,
}

impl InferenceEngine {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self {
            bundle,
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Run inference on an assembled matrix
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        if matrix.columns() != self.bundle.required_features() {
            return Err(InferenceError::ColumnOrder {
                expected: self.bundle.required_features().to_vec(),
                actual: matrix.columns().to_vec(),
            });
        }

        let scaled = self.bundle.scaler().transform(matrix.values())?;
        let codes = self.bundle.classifier().predict(&scaled)?;
        if codes.len() != matrix.nrows() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{} predictions", matrix.nrows()),
                actual: format!("{} predictions", codes.len()),
            });
        }
        let labels = self.bundle.label_encoder().inverse_transform(&codes)?;

        let latency_ms = start.elapsed().as_millis() as u64;
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        debug!(
            "{} bundle classified {} rows in {}ms",
            self.bundle.name(),
            labels.len(),
            latency_ms
        );

        Ok(InferenceResult {
            labels,
            codes,
            latency_ms,
        })
    }

    /// Number of successful `predict` calls
    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }
}

impl FaultClassifier for InferenceEngine {
    fn name(&self) -> &str {
        self.bundle.name()
    }

    fn required_features(&self) -> &[String] {
        self.bundle.required_features()
    }

    fn classify(&self, matrix: &FeatureMatrix) -> Result<Vec<String>, InferenceError> {
        self.predict(matrix).map(|r| r.labels)
    }

    fn describe(&self) -> BundleDescriptor {
        self.bundle.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classifier, LabelEncoder, StandardScaler};
    use ndarray::{array, Array2};

    /// Class 1 when the first scaled column is positive
    struct Threshold;

    impl Classifier for Threshold {
        fn predict(&self, scaled: &Array2<f64>) -> Result<Vec<i64>, InferenceError> {
            Ok(scaled.rows().into_iter().map(|r| i64::from(r[0] > 0.0)).collect())
        }
    }

    struct OutOfRange;

    impl Classifier for OutOfRange {
        fn predict(&self, scaled: &Array2<f64>) -> Result<Vec<i64>, InferenceError> {
            Ok(vec![7; scaled.nrows()])
        }
    }

    fn engine(classifier: Box<dyn Classifier>) -> InferenceEngine {
        let bundle = ArtifactBundle::new(
            "test",
            StandardScaler::new(vec![70.0, 5.0], vec![10.0, 1.0]).unwrap(),
            classifier,
            vec!["Temperature_C".into(), "Pressure_bar".into()],
            LabelEncoder::new(vec!["Normal".into(), "Cavitation".into()]).unwrap(),
        )
        .unwrap();
        InferenceEngine::new(Arc::new(bundle))
    }

    fn matrix(columns: &[&str], values: Array2<f64>) -> FeatureMatrix {
        FeatureMatrix::from_parts(columns.iter().map(|c| c.to_string()).collect(), values).unwrap()
    }

    #[test]
    fn test_scale_predict_decode() {
        let engine = engine(Box::new(Threshold));
        let m = matrix(&["Temperature_C", "Pressure_bar"], array![[60.0, 5.0], [90.0, 5.0]]);
        let result = engine.predict(&m).unwrap();
        assert_eq!(result.codes, vec![0, 1]);
        assert_eq!(result.labels, vec!["Normal", "Cavitation"]);
        assert_eq!(engine.inference_count(), 1);
    }

    #[test]
    fn test_column_order_enforced() {
        let engine = engine(Box::new(Threshold));
        let m = matrix(&["Pressure_bar", "Temperature_C"], array![[5.0, 60.0]]);
        assert!(matches!(engine.predict(&m), Err(InferenceError::ColumnOrder { .. })));
    }

    #[test]
    fn test_unknown_code_propagates() {
        let engine = engine(Box::new(OutOfRange));
        let m = matrix(&["Temperature_C", "Pressure_bar"], array![[60.0, 5.0]]);
        assert!(matches!(engine.classify(&m), Err(InferenceError::UnknownClass(7))));
    }

    #[test]
    fn test_empty_matrix() {
        let engine = engine(Box::new(Threshold));
        let m = matrix(&["Temperature_C", "Pressure_bar"], Array2::zeros((0, 2)));
        assert!(engine.classify(&m).unwrap().is_empty());
    }
}
