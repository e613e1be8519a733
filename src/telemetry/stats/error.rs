//! Structured errors raised while decoding stat text.
//!
//! - [`StatParseError::InvalidKeyValue`]: a known key carried a non-integer value.
//! - [`StatParseError::DuplicateField`]: a key repeated where the record forbids it.
//! - [`StatParseError::InvalidDevice`]: an `io.stat` line did not start with `major:minor`.
//! - [`StatParseError::InvalidValue`]: a single scalar (a pid, a byte count) failed to parse.
//! - [`StatParseError::MalformedOutput`]: tool output (`df`) did not have the expected shape.

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid device identifier '{token}' at line {line}")]
    InvalidDevice { token: String, line: usize },

    #[error("invalid value '{value}': {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unable to parse {what} output: {output:?}")]
    MalformedOutput { what: &'static str, output: String },
}
