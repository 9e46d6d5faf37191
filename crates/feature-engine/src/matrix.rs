//! Feature Matrix Assembly
//!
//! A fitted scaler/classifier pair only understands columns by position.
//! The projection below is therefore always rebuilt from the bundle's declared
//! feature order, even when the engineered order already looks identical;
//! any drift would silently permute what each matrix column means.

use crate::features::{DerivedFeature, FeatureTable};
use crate::FeatureError;
use data_validator::BaseColumn;
use ndarray::Array2;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
enum ColumnRef {
    Base(BaseColumn),
    Derived(DerivedFeature),
}

impl ColumnRef {
    fn resolve(name: &str) -> Option<Self> {
        BaseColumn::from_name(name)
            .map(ColumnRef::Base)
            .or_else(|| DerivedFeature::from_name(name).map(ColumnRef::Derived))
    }
}

/// Rows projected onto a model's required features, in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Build a matrix directly; the column count must match the array width
    pub fn from_parts(columns: Vec<String>, values: Array2<f64>) -> Result<Self, FeatureError> {
        if columns.len() != values.ncols() {
            return Err(FeatureError::Shape(format!(
                "{} column names for {} matrix columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Project `table` onto `required`, failing with the sorted set of
    /// required names the table does not carry
    pub fn assemble(table: &FeatureTable, required: &[String]) -> Result<Self, FeatureError> {
        let mut resolved = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for name in required {
            match ColumnRef::resolve(name) {
                Some(column) if table.has_column(name) => resolved.push(column),
                _ => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            missing.sort();
            missing.dedup();
            warn!("Feature matrix missing {:?}", missing);
            return Err(FeatureError::MissingFeatures(missing));
        }

        let values = Array2::from_shape_fn((table.len(), resolved.len()), |(i, j)| {
            let row = &table.rows[i];
            match resolved[j] {
                ColumnRef::Base(column) => row.sensor.get(column),
                ColumnRef::Derived(feature) => row.derived(feature),
            }
        });

        debug!("Assembled feature matrix {}x{}", values.nrows(), values.ncols());
        Ok(Self {
            columns: required.to_vec(),
            values,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureEngineer;
    use data_validator::SensorRow;
    use proptest::prelude::*;

    fn table() -> FeatureTable {
        let engineer = FeatureEngineer::default();
        let rows = (0..3)
            .map(|i| {
                let row = SensorRow {
                    rotational_speed_rpm: 1500.0 + i as f64,
                    torque_nm: 40.0,
                    vibration_x_mm_s: 2.0,
                    vibration_y_mm_s: 2.5,
                    vibration_z_mm_s: 3.0,
                    temperature_c: 70.0 + i as f64,
                    pressure_bar: 5.0,
                    flow_rate_lpm: 200.0,
                    timestamp: None,
                };
                engineer.derive(&row).0
            })
            .collect();
        FeatureTable { rows, replaced_values: 0 }
    }

    fn all_names() -> Vec<String> {
        table().column_names().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_declared_order_is_kept() {
        let required = vec![
            "Temperature_C".to_string(),
            "Rotational_Speed_RPM".to_string(),
            "Temp_Pressure".to_string(),
        ];
        let matrix = FeatureMatrix::assemble(&table(), &required).unwrap();
        assert_eq!(matrix.columns(), required.as_slice());
        assert_eq!(matrix.values()[[2, 0]], 72.0);
        assert_eq!(matrix.values()[[2, 1]], 1502.0);
        assert_eq!(matrix.values()[[2, 2]], 360.0);
    }

    #[test]
    fn test_missing_features_reported_sorted() {
        let required = vec![
            "Torque_Nm".to_string(),
            "Pump_Age".to_string(),
            "Bearing_Temp".to_string(),
        ];
        let err = FeatureMatrix::assemble(&table(), &required).unwrap_err();
        assert_eq!(
            err,
            FeatureError::MissingFeatures(vec!["Bearing_Temp".to_string(), "Pump_Age".to_string()])
        );
    }

    #[test]
    fn test_from_parts_checks_width() {
        let err = FeatureMatrix::from_parts(vec!["a".to_string()], Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, FeatureError::Shape(_)));
    }

    proptest! {
        #[test]
        fn prop_columns_follow_required_order(
            order in Just(all_names()).prop_shuffle()
        ) {
            let t = table();
            let matrix = FeatureMatrix::assemble(&t, &order).unwrap();
            prop_assert_eq!(matrix.columns(), order.as_slice());
            for (j, name) in order.iter().enumerate() {
                for (i, row) in t.rows.iter().enumerate() {
                    prop_assert_eq!(matrix.values()[[i, j]].to_bits(), row.value(name).unwrap().to_bits());
                }
            }
        }
    }
}
