//! Schema Validator for Required Columns

use crate::error::ValidationError;
use crate::schema::BaseColumn;
use crate::table::RawTable;
use tracing::{debug, warn};

/// Checks an upload carries every required base column
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    required: Vec<String>,
}

impl SchemaValidator {
    /// Create a validator for an explicit column set
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Required names absent from the table header, sorted
    pub fn missing_columns(&self, table: &RawTable) -> Vec<String> {
        let mut missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !table.has_column(name))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Fail with the sorted missing set when any column is absent
    pub fn validate(&self, table: &RawTable) -> Result<(), ValidationError> {
        let missing = self.missing_columns(table);
        if missing.is_empty() {
            debug!("Schema check passed for {} required columns", self.required.len());
            Ok(())
        } else {
            warn!("Upload rejected, missing columns: {:?}", missing);
            Err(ValidationError::MissingColumns(missing))
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(BaseColumn::ALL.iter().map(|c| c.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), Vec::new())
    }

    #[test]
    fn test_complete_schema() {
        let names: Vec<&str> = BaseColumn::ALL.iter().map(|c| c.name()).collect();
        let validator = SchemaValidator::default();
        assert!(validator.missing_columns(&table(&names)).is_empty());
        assert!(validator.validate(&table(&names)).is_ok());
    }

    #[test]
    fn test_missing_pressure() {
        let names: Vec<&str> = BaseColumn::ALL
            .iter()
            .filter(|c| **c != BaseColumn::Pressure)
            .map(|c| c.name())
            .collect();
        let err = SchemaValidator::default().validate(&table(&names)).unwrap_err();
        assert_eq!(err, ValidationError::MissingColumns(vec!["Pressure_bar".to_string()]));
    }

    #[test]
    fn test_missing_are_sorted() {
        let validator = SchemaValidator::default();
        let missing = validator.missing_columns(&table(&["Torque_Nm", "Pump_ID"]));
        let mut sorted = missing.clone();
        sorted.sort();
        assert_eq!(missing, sorted);
        assert_eq!(missing.len(), 7);
        assert!(!missing.contains(&"Torque_Nm".to_string()));
    }

    #[test]
    fn test_input_untouched() {
        let original = table(&["Torque_Nm"]);
        let copy = original.clone();
        let _ = SchemaValidator::default().missing_columns(&original);
        assert_eq!(original, copy);
    }
}
