//! Storage Layer
//!
//! Keeps prediction results addressable by handle, with their annotated
//! files written to the output directory.

mod store;

pub use store::{sanitize_file_name, ResultEntry, ResultStore, FILE_PREFIX};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}
