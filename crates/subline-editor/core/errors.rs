//! Error types for the subline-editor crate
//!
//! Provides the main `EditorError` enum that wraps `CoreError` from
//! subline-core and adds editor-specific error cases for collection access,
//! undo transactions, command execution and persistence.

use core::fmt;
use subline_core::CoreError;
use thiserror::Error;

/// Main error type for subline-editor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Errors from subline-core
    #[error(transparent)]
    Core(CoreError),

    /// Index does not address an existing record
    #[error("Index out of range: {index} (collection length: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Range does not fit inside the collection
    #[error("Range out of bounds: {index}+{count} (collection length: {len})")]
    RangeOutOfBounds {
        index: usize,
        count: usize,
        len: usize,
    },

    /// Undo or redo requested while a bulk scope is still open
    #[error("Cannot {action} while a bulk edit is in progress")]
    TransactionActive { action: &'static str },

    /// Undo/redo operation failed
    #[error("History operation failed: {message}")]
    HistoryError { message: String },

    /// No command registered under this name
    #[error("Unknown command: {name}")]
    CommandNotFound { name: String },

    /// Command arguments could not be interpreted
    #[error("Invalid arguments for {command}: {message}")]
    InvalidArguments { command: String, message: String },

    /// Command execution failed
    #[error("Command execution failed: {message}")]
    CommandFailed { message: String },

    /// Background worker could not be started
    #[error("Worker error: {message}")]
    WorkerError { message: String },

    /// Import/export error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl EditorError {
    /// Create a new command failed error
    pub fn command_failed<T: fmt::Display>(message: T) -> Self {
        Self::CommandFailed {
            message: message.to_string(),
        }
    }

    /// Create a new invalid arguments error
    pub fn invalid_arguments<T: fmt::Display>(command: &str, message: T) -> Self {
        Self::InvalidArguments {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a new history error
    pub fn history<T: fmt::Display>(message: T) -> Self {
        Self::HistoryError {
            message: message.to_string(),
        }
    }

    /// Create a new IO error
    pub fn io<T: fmt::Display>(message: T) -> Self {
        Self::IoError(message.to_string())
    }

    /// Create a new serialization error
    pub fn serialization<T: fmt::Display>(message: T) -> Self {
        Self::SerializationError {
            message: message.to_string(),
        }
    }

    /// Check if error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Core(core_err) => core_err.is_recoverable(),
            Self::IndexOutOfRange { .. }
            | Self::RangeOutOfBounds { .. }
            | Self::TransactionActive { .. }
            | Self::CommandNotFound { .. }
            | Self::InvalidArguments { .. }
            | Self::CommandFailed { .. }
            | Self::IoError(..)
            | Self::SerializationError { .. } => true,
            Self::HistoryError { .. } | Self::WorkerError { .. } => false,
        }
    }

    /// Check if this is an index-related error
    #[must_use]
    pub const fn is_index_error(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::RangeOutOfBounds { .. }
        )
    }

    /// Get the underlying core error if this wraps one
    #[must_use]
    pub const fn as_core_error(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core_err) => Some(core_err),
            _ => None,
        }
    }
}

/// Result type alias for editor operations
pub type Result<T> = core::result::Result<T, EditorError>;

impl From<CoreError> for EditorError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}
