//! Core error type for subline
//!
//! Follows the same philosophy as the rest of the workspace:
//! - Use `thiserror` for structured error handling (no `anyhow`)
//! - Provide enough context to explain the failure to the user

use core::fmt;
use thiserror::Error;

/// Errors produced by record and timing utilities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Time format parsing errors
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// Record data violates an invariant
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Create a validation error from any displayable message
    pub fn validation<T: fmt::Display>(message: T) -> Self {
        Self::Validation(message.to_string())
    }

    /// Check if error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidTime(_) | Self::Validation(_) => true,
            Self::InvalidRecord(_) => false,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = core::result::Result<T, CoreError>;
