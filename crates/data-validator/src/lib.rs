//! Data Validation and Imputation
//!
//! Reads uploaded sensor CSVs, checks them against the required base schema,
//! and fills missing cells with batch-relative column means.

mod error;
mod imputer;
mod schema;
mod table;
mod validator;

pub use error::ValidationError;
pub use imputer::{ImputationReport, Imputer, SensorBatch, SYNTHETIC_EPOCH};
pub use schema::{BaseColumn, SensorRow, FAULT_TYPE_COLUMN, TIMESTAMP_COLUMN};
pub use table::RawTable;
pub use validator::SchemaValidator;
