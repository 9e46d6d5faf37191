//! Raw CSV Table

use crate::error::ValidationError;
use std::io::Read;
use tracing::debug;

/// Uploaded CSV as header names and raw string cells
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from already-split cells
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    /// Parse CSV content. Headers and cells are trimmed.
    ///
    /// Every record must have as many cells as the header; ragged rows are
    /// reported as an invalid format rather than silently padded.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ValidationError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| ValidationError::InvalidFormat(format!("Failed to read CSV headers: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ValidationError::InvalidFormat("CSV header row is empty".to_string()));
        }

        let mut records = Vec::new();
        for (row_num, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| ValidationError::InvalidFormat(format!("CSV row {}: {e}", row_num + 1)))?;
            records.push(record.iter().map(str::to_string).collect());
        }

        debug!("Parsed CSV with {} columns and {} rows", headers.len(), records.len());
        Ok(Self { headers, records })
    }

    /// Parse CSV content from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        Self::from_reader(bytes)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column); `None` when out of range
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.records.get(row).and_then(|r| r.get(column)).map(String::as_str)
    }
}
