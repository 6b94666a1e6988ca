//! Errors shared by every module of the crate

use thiserror::Error;

/// A caller violated the contract of an operation.
///
/// These are programming errors such as negative sizes or adding an entry
/// that must not exist yet. They are kept apart from file format errors so
/// callers can tell a broken archive from a broken call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid argument `{name}`: {reason}")]
pub struct ArgumentError {
    /// Name of the offending argument
    pub name: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl ArgumentError {
    /// Create a new argument error
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }

    /// Error for a signed value that must not be negative
    pub fn negative(name: &'static str, value: i64) -> Self {
        Self::new(name, format!("cannot be negative (got {value})"))
    }
}

/// Convert an on-disk signed size or offset into an unsigned one.
pub fn non_negative(name: &'static str, value: i64) -> Result<u64, ArgumentError> {
    u64::try_from(value).map_err(|_| ArgumentError::negative(name, value))
}
