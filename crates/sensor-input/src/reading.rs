//! Sensor Reading Model

use serde::{Deserialize, Serialize};

/// Machine id recorded when the operator leaves the field blank
pub const UNKNOWN_MACHINE_ID: &str = "Unknown";

/// Operator-facing fields of a reading, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    MachineId,
    Temperature,
    Vibration,
    HoursRun,
    Pressure,
}

impl Field {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::MachineId => "machine_id",
            Field::Temperature => "temperature",
            Field::Vibration => "vibration",
            Field::HoursRun => "hours_run",
            Field::Pressure => "pressure",
        }
    }

    /// Prompt shown to the operator, including an example value
    pub fn prompt(&self) -> &'static str {
        match self {
            Field::MachineId => "Machine ID (e.g., M1, M2)",
            Field::Temperature => "Temperature (e.g., 85.5)",
            Field::Vibration => "Vibration (e.g., 4.2)",
            Field::HoursRun => "Hours Run (e.g., 3450.0)",
            Field::Pressure => "Pressure (e.g., 115.8)",
        }
    }
}

/// One snapshot of sensor measurements for a machine.
///
/// Fields are private: a reading is built once from validated input and
/// never changes afterwards. It is serialized for logging but never
/// deserialized, so [`SensorReading::new`] is the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    machine_id: String,
    temperature: f64,
    vibration: f64,
    hours_run: f64,
    pressure: f64,
}

impl SensorReading {
    /// Create a reading, normalizing an empty or absent machine id to
    /// [`UNKNOWN_MACHINE_ID`]. Measurements must already be finite, as
    /// produced by [`parse_measurement`](crate::parse_measurement).
    pub fn new(
        machine_id: Option<String>,
        temperature: f64,
        vibration: f64,
        hours_run: f64,
        pressure: f64,
    ) -> Self {
        let machine_id = machine_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| UNKNOWN_MACHINE_ID.to_string());
        debug_assert!(
            [temperature, vibration, hours_run, pressure]
                .iter()
                .all(|v| v.is_finite()),
            "sensor measurements must be finite"
        );

        Self {
            machine_id,
            temperature,
            vibration,
            hours_run,
            pressure,
        }
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn vibration(&self) -> f64 {
        self.vibration
    }

    pub fn hours_run(&self) -> f64 {
        self.hours_run
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Measurements ordered temperature, vibration, hours run, pressure
    pub fn measurements(&self) -> [f64; 4] {
        [self.temperature, self.vibration, self.hours_run, self.pressure]
    }
}
