//! Standard Scaler (transform only)

use crate::InferenceError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Per-column `(x - mean) / scale`, fitted elsewhere and never refit here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(alias = "mean_")]
    mean: Vec<f64>,
    #[serde(alias = "scale_")]
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, InferenceError> {
        let scaler = Self { mean, scale };
        scaler.check()?;
        Ok(scaler)
    }

    /// Validate fitted parameters
    pub fn check(&self) -> Result<(), InferenceError> {
        if self.mean.len() != self.scale.len() {
            return Err(InferenceError::InconsistentBundle(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(idx) = self.scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(InferenceError::InconsistentBundle(format!(
                "scaler scale[{idx}] = {} is not usable",
                self.scale[idx]
            )));
        }
        if let Some(idx) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(InferenceError::InconsistentBundle(format!("scaler mean[{idx}] is not finite")));
        }
        Ok(())
    }

    /// Number of columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        if x.ncols() != self.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[_, {}]", self.n_features()),
                actual: format!("[{}, {}]", x.nrows(), x.ncols()),
            });
        }
        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        Ok((x - &mean) / &scale)
    }
}
