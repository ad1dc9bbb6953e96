//! Input Error Types

use thiserror::Error;

/// Rejection of a single operator-supplied field value.
///
/// These are expected outcomes of parsing, recovered by re-prompting the
/// operator for the same field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Nothing but whitespace was entered
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// Text could not be parsed as a number
    #[error("{field} value {input:?} is not a number")]
    NotANumber { field: &'static str, input: String },

    /// Line was not valid UTF-8 text
    #[error("{field} value is not readable text")]
    NotText { field: &'static str },

    /// Parsed, but NaN or infinite
    #[error("{field} value {input:?} is not a finite number")]
    NonFinite { field: &'static str, input: String },
}

/// Failures of the operator channel itself
#[derive(Debug, Error)]
pub enum InputError {
    /// Input ended before the field was supplied
    #[error("Input closed while reading {field}")]
    Closed { field: &'static str },

    /// Reading from or writing to the operator channel failed
    #[error("Operator channel error: {0}")]
    Io(#[from] std::io::Error),
}
