//! Validation Error Types

use thiserror::Error;

/// Errors raised while ingesting and validating an upload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required base columns absent from the header (sorted)
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// Content could not be read as CSV
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Header present but no data rows
    #[error("Uploaded file contains no data rows")]
    EmptyBatch,
}
