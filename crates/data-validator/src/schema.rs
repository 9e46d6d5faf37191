//! Base Sensor Schema

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Optional timestamp column name
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Output label column name
pub const FAULT_TYPE_COLUMN: &str = "Fault_Type";

/// The eight raw measurements every upload must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaseColumn {
    RotationalSpeed,
    Torque,
    VibrationX,
    VibrationY,
    VibrationZ,
    Temperature,
    Pressure,
    FlowRate,
}

impl BaseColumn {
    /// All base columns in canonical order
    pub const ALL: [BaseColumn; 8] = [
        BaseColumn::RotationalSpeed,
        BaseColumn::Torque,
        BaseColumn::VibrationX,
        BaseColumn::VibrationY,
        BaseColumn::VibrationZ,
        BaseColumn::Temperature,
        BaseColumn::Pressure,
        BaseColumn::FlowRate,
    ];

    /// Exact CSV header name
    pub fn name(&self) -> &'static str {
        match self {
            BaseColumn::RotationalSpeed => "Rotational_Speed_RPM",
            BaseColumn::Torque => "Torque_Nm",
            BaseColumn::VibrationX => "Vibration_X_mm_s",
            BaseColumn::VibrationY => "Vibration_Y_mm_s",
            BaseColumn::VibrationZ => "Vibration_Z_mm_s",
            BaseColumn::Temperature => "Temperature_C",
            BaseColumn::Pressure => "Pressure_bar",
            BaseColumn::FlowRate => "Flow_Rate_LPM",
        }
    }

    /// Look up a base column by header name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// One timestamped observation with all base fields numeric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorRow {
    pub timestamp: Option<NaiveDateTime>,
    pub rotational_speed_rpm: f64,
    pub torque_nm: f64,
    pub vibration_x_mm_s: f64,
    pub vibration_y_mm_s: f64,
    pub vibration_z_mm_s: f64,
    pub temperature_c: f64,
    pub pressure_bar: f64,
    pub flow_rate_lpm: f64,
}

impl SensorRow {
    /// Read a base field
    pub fn get(&self, column: BaseColumn) -> f64 {
        match column {
            BaseColumn::RotationalSpeed => self.rotational_speed_rpm,
            BaseColumn::Torque => self.torque_nm,
            BaseColumn::VibrationX => self.vibration_x_mm_s,
            BaseColumn::VibrationY => self.vibration_y_mm_s,
            BaseColumn::VibrationZ => self.vibration_z_mm_s,
            BaseColumn::Temperature => self.temperature_c,
            BaseColumn::Pressure => self.pressure_bar,
            BaseColumn::FlowRate => self.flow_rate_lpm,
        }
    }

    /// Overwrite a base field
    pub fn set(&mut self, column: BaseColumn, value: f64) {
        let slot = match column {
            BaseColumn::RotationalSpeed => &mut self.rotational_speed_rpm,
            BaseColumn::Torque => &mut self.torque_nm,
            BaseColumn::VibrationX => &mut self.vibration_x_mm_s,
            BaseColumn::VibrationY => &mut self.vibration_y_mm_s,
            BaseColumn::VibrationZ => &mut self.vibration_z_mm_s,
            BaseColumn::Temperature => &mut self.temperature_c,
            BaseColumn::Pressure => &mut self.pressure_bar,
            BaseColumn::FlowRate => &mut self.flow_rate_lpm,
        };
        *slot = value;
    }

    /// X/Y/Z vibration triple
    pub fn vibration(&self) -> [f64; 3] {
        [self.vibration_x_mm_s, self.vibration_y_mm_s, self.vibration_z_mm_s]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for column in BaseColumn::ALL {
            assert_eq!(BaseColumn::from_name(column.name()), Some(column));
        }
        assert_eq!(BaseColumn::from_name("Pump_ID"), None);
    }

    #[test]
    fn test_get_set() {
        let mut row = SensorRow::default();
        row.set(BaseColumn::Pressure, 4.5);
        assert_eq!(row.get(BaseColumn::Pressure), 4.5);
        assert_eq!(row.pressure_bar, 4.5);
    }
}
