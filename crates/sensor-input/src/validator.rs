//! Field Parsers

use crate::error::ValidationError;
use crate::reading::{Field, UNKNOWN_MACHINE_ID};

/// Parse a measurement as a finite number.
///
/// Surrounding whitespace is ignored. Empty text, text that is not a number
/// and NaN/infinite values are rejected.
pub fn parse_measurement(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty {
            field: field.as_str(),
        });
    }

    let value: f64 = text.parse().map_err(|_| ValidationError::NotANumber {
        field: field.as_str(),
        input: text.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.as_str(),
            input: text.to_string(),
        });
    }

    Ok(value)
}

/// Normalize a machine id; never fails
pub fn parse_machine_id(raw: Option<&str>) -> String {
    match raw {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => UNKNOWN_MACHINE_ID.to_string(),
    }
}
