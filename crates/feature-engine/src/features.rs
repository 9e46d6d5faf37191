//! Derived Feature Computation
//!
//! Every derived column is a pure function of the same row's base columns.
//! After derivation a lossy fallback rewrites any infinite or NaN value to 0
//! in *every* column, base and derived alike; downstream stages do not
//! distinguish a genuine zero from a replaced one.

use crate::statistics::StatisticalFeatures;
use data_validator::{BaseColumn, SensorBatch, SensorRow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Added to pressure before dividing flow by it
pub const PRESSURE_EPSILON: f64 = 1e-3;

/// The six engineered columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivedFeature {
    VibrationMean,
    VibrationStd,
    VibrationRange,
    FlowToPressure,
    TorqueRpm,
    TempPressure,
}

impl DerivedFeature {
    pub const ALL: [DerivedFeature; 6] = [
        DerivedFeature::VibrationMean,
        DerivedFeature::VibrationStd,
        DerivedFeature::VibrationRange,
        DerivedFeature::FlowToPressure,
        DerivedFeature::TorqueRpm,
        DerivedFeature::TempPressure,
    ];

    /// Column name as written to CSV and expected by bundles
    pub fn name(&self) -> &'static str {
        match self {
            DerivedFeature::VibrationMean => "Vibration_Mean",
            DerivedFeature::VibrationStd => "Vibration_Std",
            DerivedFeature::VibrationRange => "Vibration_Range",
            DerivedFeature::FlowToPressure => "Flow_to_Pressure",
            DerivedFeature::TorqueRpm => "Torque_RPM",
            DerivedFeature::TempPressure => "Temp_Pressure",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Sensor row plus its derived features
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureRow {
    pub sensor: SensorRow,
    pub vibration_mean: f64,
    pub vibration_std: f64,
    pub vibration_range: f64,
    pub flow_to_pressure: f64,
    pub torque_rpm: f64,
    pub temp_pressure: f64,
}

impl FeatureRow {
    pub fn derived(&self, feature: DerivedFeature) -> f64 {
        match feature {
            DerivedFeature::VibrationMean => self.vibration_mean,
            DerivedFeature::VibrationStd => self.vibration_std,
            DerivedFeature::VibrationRange => self.vibration_range,
            DerivedFeature::FlowToPressure => self.flow_to_pressure,
            DerivedFeature::TorqueRpm => self.torque_rpm,
            DerivedFeature::TempPressure => self.temp_pressure,
        }
    }

    /// Value of a base or derived column by name
    pub fn value(&self, name: &str) -> Option<f64> {
        if let Some(column) = BaseColumn::from_name(name) {
            return Some(self.sensor.get(column));
        }
        DerivedFeature::from_name(name).map(|f| self.derived(f))
    }

    /// Replace non-finite values with 0, returning how many were replaced
    fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for column in BaseColumn::ALL {
            let v = self.sensor.get(column);
            if !v.is_finite() {
                self.sensor.set(column, 0.0);
                replaced += 1;
            }
        }
        for slot in [
            &mut self.vibration_mean,
            &mut self.vibration_std,
            &mut self.vibration_range,
            &mut self.flow_to_pressure,
            &mut self.torque_rpm,
            &mut self.temp_pressure,
        ] {
            if !slot.is_finite() {
                *slot = 0.0;
                replaced += 1;
            }
        }
        replaced
    }
}

/// Engineered rows with their column set
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// Non-finite cells rewritten to 0
    pub replaced_values: usize,
}

impl FeatureTable {
    /// Columns available to the matrix assembler: base then derived
    pub fn column_names(&self) -> Vec<&'static str> {
        BaseColumn::ALL
            .iter()
            .map(|c| c.name())
            .chain(DerivedFeature::ALL.iter().map(|f| f.name()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        BaseColumn::from_name(name).is_some() || DerivedFeature::from_name(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derives secondary features row by row
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    epsilon: f64,
}

impl FeatureEngineer {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Derive features for a single row, applying the non-finite fallback
    pub fn derive(&self, row: &SensorRow) -> (FeatureRow, usize) {
        let vibration = StatisticalFeatures::compute(&row.vibration());

        let mut features = FeatureRow {
            sensor: row.clone(),
            vibration_mean: vibration.mean,
            vibration_std: vibration.std_dev,
            vibration_range: vibration.range(),
            flow_to_pressure: row.flow_rate_lpm / (row.pressure_bar + self.epsilon),
            torque_rpm: row.torque_nm * row.rotational_speed_rpm,
            temp_pressure: row.temperature_c * row.pressure_bar,
        };
        let replaced = features.sanitize();
        (features, replaced)
    }

    /// Derive features for every row of an imputed batch
    pub fn engineer(&self, batch: &SensorBatch) -> FeatureTable {
        let mut replaced_values = 0;
        let rows = batch
            .rows
            .iter()
            .map(|row| {
                let (features, replaced) = self.derive(row);
                replaced_values += replaced;
                features
            })
            .collect::<Vec<_>>();

        if replaced_values > 0 {
            warn!("Replaced {} non-finite values with 0", replaced_values);
        }
        debug!("Engineered {} derived features for {} rows", DerivedFeature::ALL.len(), rows.len());

        FeatureTable { rows, replaced_values }
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(PRESSURE_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_row() -> SensorRow {
        SensorRow {
            timestamp: None,
            rotational_speed_rpm: 1500.0,
            torque_nm: 40.0,
            vibration_x_mm_s: 2.0,
            vibration_y_mm_s: 4.0,
            vibration_z_mm_s: 6.0,
            temperature_c: 70.0,
            pressure_bar: 5.0,
            flow_rate_lpm: 200.0,
        }
    }

    #[test]
    fn test_derivations() {
        let (f, replaced) = FeatureEngineer::default().derive(&sample_row());
        assert_eq!(replaced, 0);
        assert_eq!(f.vibration_mean, 4.0);
        assert!((f.vibration_std - 2.0).abs() < 1e-12);
        assert_eq!(f.vibration_range, 4.0);
        assert!((f.flow_to_pressure - 200.0 / 5.001).abs() < 1e-12);
        assert_eq!(f.torque_rpm, 60_000.0);
        assert_eq!(f.temp_pressure, 350.0);
    }

    #[test]
    fn test_zero_pressure_uses_epsilon() {
        let row = SensorRow { pressure_bar: 0.0, ..sample_row() };
        let (f, _) = FeatureEngineer::default().derive(&row);
        assert!((f.flow_to_pressure - 200_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_pressure_zeroed() {
        // -epsilon makes the denominator exactly zero
        let row = SensorRow { pressure_bar: -PRESSURE_EPSILON, ..sample_row() };
        let (f, replaced) = FeatureEngineer::default().derive(&row);
        assert_eq!(f.flow_to_pressure, 0.0);
        assert_eq!(replaced, 1);
    }

    #[test]
    fn test_fallback_applies_to_base_columns() {
        let row = SensorRow {
            temperature_c: f64::INFINITY,
            torque_nm: f64::NAN,
            ..sample_row()
        };
        let (f, replaced) = FeatureEngineer::default().derive(&row);
        assert_eq!(f.sensor.temperature_c, 0.0);
        assert_eq!(f.sensor.torque_nm, 0.0);
        assert_eq!(f.temp_pressure, 0.0);
        assert_eq!(f.torque_rpm, 0.0);
        assert_eq!(replaced, 4);
    }

    #[test]
    fn test_value_lookup() {
        let (f, _) = FeatureEngineer::default().derive(&sample_row());
        assert_eq!(f.value("Torque_Nm"), Some(40.0));
        assert_eq!(f.value("Torque_RPM"), Some(60_000.0));
        assert_eq!(f.value("Pump_ID"), None);
    }

    #[test]
    fn test_column_names() {
        let table = FeatureTable::default();
        let names = table.column_names();
        assert_eq!(names.len(), 14);
        assert!(table.has_column("Vibration_Std"));
        assert!(!table.has_column("Fault_Type"));
    }

    proptest! {
        #[test]
        fn prop_derivation_is_deterministic(
            values in proptest::collection::vec(-1.0e4f64..1.0e4, 8)
        ) {
            let mut row = SensorRow::default();
            for (column, v) in BaseColumn::ALL.iter().zip(&values) {
                row.set(*column, *v);
            }
            let engineer = FeatureEngineer::default();
            let (a, _) = engineer.derive(&row);
            let (b, _) = engineer.derive(&row.clone());
            for feature in DerivedFeature::ALL {
                prop_assert_eq!(a.derived(feature).to_bits(), b.derived(feature).to_bits());
                prop_assert!(a.derived(feature).is_finite());
            }
        }
    }
}
