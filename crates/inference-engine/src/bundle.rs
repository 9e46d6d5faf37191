//! Artifact Bundle Loading

use crate::classifier::{Classifier, OnnxClassifier};
use crate::label::LabelEncoder;
use crate::scaler::StandardScaler;
use crate::InferenceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a bundle's four artifacts live on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePaths {
    /// Human-readable bundle name (e.g. "production")
    pub name: String,
    pub dir: PathBuf,
    /// Prepended to each file name, e.g. "sim_"
    #[serde(default)]
    pub prefix: String,
}

impl BundlePaths {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    fn file(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, stem))
    }

    pub fn scaler(&self) -> PathBuf {
        self.file("scaler.json")
    }

    pub fn features(&self) -> PathBuf {
        self.file("features.json")
    }

    pub fn label_encoder(&self) -> PathBuf {
        self.file("label_encoder.json")
    }

    pub fn model(&self) -> PathBuf {
        self.file("model.onnx")
    }
}

/// Summary of a loaded bundle
#[derive(Debug, Clone, Serialize)]
pub struct BundleDescriptor {
    pub name: String,
    pub features: Vec<String>,
    pub classes: Vec<String>,
    pub classifier: String,
}

/// Fitted scaler, classifier, ordered feature list, and label encoder.
/// Immutable once built.
pub struct ArtifactBundle {
    name: String,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
    required_features: Vec<String>,
    label_encoder: LabelEncoder,
}

impl ArtifactBundle {
    /// Assemble a bundle from already-loaded parts, checking they agree
    pub fn new(
        name: impl Into<String>,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
        required_features: Vec<String>,
        label_encoder: LabelEncoder,
    ) -> Result<Self, InferenceError> {
        let name = name.into();
        scaler.check()?;
        label_encoder.check()?;

        if required_features.is_empty() {
            return Err(InferenceError::InconsistentBundle(format!("{name}: empty feature list")));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = required_features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(InferenceError::InconsistentBundle(format!("{name}: duplicate feature '{dup}'")));
        }
        if scaler.n_features() != required_features.len() {
            return Err(InferenceError::InconsistentBundle(format!(
                "{name}: scaler fitted on {} columns but feature list has {}",
                scaler.n_features(),
                required_features.len()
            )));
        }

        Ok(Self {
            name,
            scaler,
            classifier,
            required_features,
            label_encoder,
        })
    }

    /// Load a bundle whose classifier is an ONNX graph
    pub fn load(paths: &BundlePaths) -> Result<Self, InferenceError> {
        info!("Loading {} bundle from {}", paths.name, paths.dir.display());
        let scaler: StandardScaler = read_json(&paths.scaler())?;
        let features: Vec<String> = read_json(&paths.features())?;
        let label_encoder: LabelEncoder = read_json(&paths.label_encoder())?;
        let classifier = OnnxClassifier::load(&paths.model(), features.len())?;

        let bundle = Self::new(paths.name.clone(), scaler, Box::new(classifier), features, label_encoder)?;
        info!(
            "Bundle {} ready: {} features, classes {:?}",
            bundle.name,
            bundle.required_features.len(),
            bundle.label_encoder.classes()
        );
        Ok(bundle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn required_features(&self) -> &[String] {
        &self.required_features
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    pub fn describe(&self) -> BundleDescriptor {
        BundleDescriptor {
            name: self.name.clone(),
            features: self.required_features.clone(),
            classes: self.label_encoder.classes().to_vec(),
            classifier: self.classifier.describe(),
        }
    }
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("name", &self.name)
            .field("required_features", &self.required_features)
            .field("classes", &self.label_encoder.classes())
            .field("classifier", &self.classifier.describe())
            .finish()
    }
}

/// Read one JSON-serialized artifact
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InferenceError> {
    let file = File::open(path).map_err(|e| InferenceError::ModelLoadError(format!("{}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| InferenceError::ModelLoadError(format!("{}: {e}", path.display())))
}
