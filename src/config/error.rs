//! Configuration error types

use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Numeric setting outside its accepted range
    #[error("Invalid {field}: {value} (expected {expected})")]
    OutOfRange {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: f64,
        /// Human-readable accepted range
        expected: &'static str,
    },

    /// Setting with an unrecognised value
    #[error("Invalid {field}: {value:?}")]
    InvalidValue {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: String,
    },
}
