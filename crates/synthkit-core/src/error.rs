//! # Error Types
//!
//! Defines `SynthKitError`, the unified error enum for every fatal failure
//! mode in the SynthKit pipeline. Non-fatal conditions (repair exhaustion,
//! rule expression errors, validator coercion failures) never surface here;
//! they are logged or counted in the validation report instead.

use thiserror::Error;

/// All errors that can occur in SynthKit operations.
#[derive(Error, Debug)]
pub enum SynthKitError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown output format '{format}'. Supported: csv, jsonl, sql")]
    UnknownFormat { format: String },

    #[error("Foreign key {table}.{column} references undeclared table '{ref_table}'")]
    UnknownReference {
        table: String,
        column: String,
        ref_table: String,
    },

    #[error("Circular dependency detected involving tables: {tables}")]
    CircularDependency { tables: String },

    #[error("Output error: {message}: {source}")]
    Output {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl SynthKitError {
    /// Shorthand for a `Config` error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        SynthKitError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthKitError>;
