//! Sensor Input
//!
//! Turns raw operator-supplied text into a validated [`SensorReading`],
//! re-prompting field by field until each value is acceptable.

mod error;
mod prompt;
mod reading;
mod validator;

pub use error::{InputError, ValidationError};
pub use prompt::Prompter;
pub use reading::{Field, SensorReading, UNKNOWN_MACHINE_ID};
pub use validator::{parse_machine_id, parse_measurement};
