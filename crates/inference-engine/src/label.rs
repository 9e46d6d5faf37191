//! Label Encoder

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bijection between class codes (indices) and fault names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    #[serde(alias = "classes_")]
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, InferenceError> {
        let encoder = Self { classes };
        encoder.check()?;
        Ok(encoder)
    }

    pub fn check(&self) -> Result<(), InferenceError> {
        if self.classes.is_empty() {
            return Err(InferenceError::InconsistentBundle("label encoder has no classes".to_string()));
        }
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(InferenceError::InconsistentBundle(format!("duplicate class '{class}'")));
            }
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of a class name
    pub fn transform(&self, label: &str) -> Option<i64> {
        self.classes
            .iter()
            .position(|c| c == label)
            .and_then(|i| i64::try_from(i).ok())
    }

    /// Decode one code
    pub fn decode(&self, code: i64) -> Result<&str, InferenceError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or(InferenceError::UnknownClass(code))
    }

    /// Decode codes, failing on the first unknown one
    pub fn inverse_transform(&self, codes: &[i64]) -> Result<Vec<String>, InferenceError> {
        codes.iter().map(|c| self.decode(*c).map(str::to_string)).collect()
    }
}
