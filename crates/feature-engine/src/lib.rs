//! Feature Engineering Engine
//!
//! Derives secondary features from imputed base sensor columns and projects
//! them onto the exact column order a fitted model expects.

mod features;
mod matrix;
mod statistics;

pub use features::{DerivedFeature, FeatureEngineer, FeatureRow, FeatureTable, PRESSURE_EPSILON};
pub use matrix::FeatureMatrix;
pub use statistics::StatisticalFeatures;

use thiserror::Error;

/// Errors during feature assembly
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Bundle expects features the engineered table does not carry (sorted)
    #[error("Missing features required by model: {0:?}")]
    MissingFeatures(Vec<String>),
    #[error("Feature matrix shape error: {0}")]
    Shape(String),
}
