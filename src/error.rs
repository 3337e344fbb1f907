//! Crate-wide error type for cmdgate.
//!
//! Only infrastructure faults (config parsing, policy construction) surface
//! here. Validation outcomes are never errors; they are returned as
//! [`ValidationResult`](crate::security::verdict::ValidationResult) data.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors raised while setting the gate up, never while validating.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration file could not be parsed or is semantically invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Policy tables could not be compiled into matchers.
    #[error("Policy error: {0}")]
    Policy(String),

    /// Underlying I/O failure (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
