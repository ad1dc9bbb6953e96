//! Interactive Prompter

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::error::{InputError, ValidationError};
use crate::reading::{Field, SensorReading};
use crate::validator::{parse_machine_id, parse_measurement};

/// Collects a [`SensorReading`] from an operator, one field at a time
pub struct Prompter<R, W> {
    input: R,
    output: W,
    /// Rejected values across all fields
    rejected: usize,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter over an input and output channel
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            rejected: 0,
        }
    }

    /// Prompt until `parser` accepts a line.
    ///
    /// There is no attempt limit. End of input is the only way out short of a
    /// valid value, and is reported as [`InputError::Closed`].
    pub fn read_field<T, F>(&mut self, field: Field, parser: F) -> Result<T, InputError>
    where
        F: Fn(&str) -> Result<T, ValidationError>,
    {
        loop {
            self.prompt(field)?;

            let line = self.read_line()?.ok_or(InputError::Closed {
                field: field.as_str(),
            })?;

            let parsed = match std::str::from_utf8(&line) {
                Ok(text) => parser(text),
                Err(_) => Err(ValidationError::NotText {
                    field: field.as_str(),
                }),
            };

            match parsed {
                Ok(value) => return Ok(value),
                Err(e) => {
                    self.rejected += 1;
                    warn!(field = field.as_str(), error = %e, "Rejected operator input");
                    writeln!(self.output, "Invalid input: {}. Please enter a number.", e)?;
                }
            }
        }
    }

    /// Read a numeric measurement, re-prompting until it is a finite number
    pub fn read_measurement(&mut self, field: Field) -> Result<f64, InputError> {
        self.read_field(field, |raw| parse_measurement(field, raw))
    }

    /// Read the machine id. Empty input and end of input both yield the
    /// unknown-machine sentinel.
    pub fn read_machine_id(&mut self) -> Result<String, InputError> {
        self.prompt(Field::MachineId)?;
        let line = self.read_line()?;
        let id = line.as_deref().map(String::from_utf8_lossy);
        Ok(parse_machine_id(id.as_deref()))
    }

    /// Collect one complete reading
    pub fn read_reading(&mut self) -> Result<SensorReading, InputError> {
        writeln!(self.output, "Enter sensor data:")?;

        let machine_id = self.read_machine_id()?;
        let temperature = self.read_measurement(Field::Temperature)?;
        let vibration = self.read_measurement(Field::Vibration)?;
        let hours_run = self.read_measurement(Field::HoursRun)?;
        let pressure = self.read_measurement(Field::Pressure)?;

        debug!(
            machine_id = %machine_id,
            rejected = self.rejected,
            "Collected sensor reading"
        );

        Ok(SensorReading::new(
            Some(machine_id),
            temperature,
            vibration,
            hours_run,
            pressure,
        ))
    }

    /// Number of values rejected so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Release the underlying channels
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn prompt(&mut self, field: Field) -> Result<(), InputError> {
        write!(self.output, "{}: ", field.prompt())?;
        self.output.flush()?;
        Ok(())
    }

    /// Next line as raw bytes without its terminator, or `None` at end of
    /// input. Decoding is left to the caller.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, InputError> {
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
