// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for robocurate.
//!
//! Provides error types for dataset access and curation:
//! - Format recognition
//! - Dataset metadata and frame access
//! - Payload decoding
//! - Filesystem reorganization

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur while reading or curating datasets.
#[derive(Debug, Clone)]
pub enum CurateError {
    /// Path matches no detection rule
    UnrecognizedFormat {
        /// Path that was classified
        path: PathBuf,
    },

    /// Dataset root was recognized but lacks something the adapter needs
    MissingMetadata {
        /// Dataset path
        path: PathBuf,
        /// What is missing
        what: String,
    },

    /// Frame index outside `[0, length)`
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of indexed frames
        length: usize,
    },

    /// Adapter used before a successful load or after close
    NotLoaded {
        /// Adapter name
        adapter: String,
    },

    /// Payload decoding error
    DecodeError {
        /// What was being decoded (e.g., "CompressedImage", "npy")
        context: String,
        /// Error message
        message: String,
    },

    /// Filesystem error with context
    IoError {
        /// Operation context
        context: String,
        /// Error message
        message: String,
    },

    /// A dataset could not be moved
    MoveFailed {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying error
        cause: String,
    },

    /// Invalid configuration
    ConfigError {
        /// Error message
        message: String,
    },

    /// Other error
    Other(String),
}

impl CurateError {
    /// Create an "unrecognized format" error.
    pub fn unrecognized(path: impl AsRef<Path>) -> Self {
        CurateError::UnrecognizedFormat {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a missing metadata error.
    pub fn missing_metadata(path: impl AsRef<Path>, what: impl Into<String>) -> Self {
        CurateError::MissingMetadata {
            path: path.as_ref().to_path_buf(),
            what: what.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, length: usize) -> Self {
        CurateError::OutOfRange { index, length }
    }

    /// Create a "not loaded" error.
    pub fn not_loaded(adapter: impl Into<String>) -> Self {
        CurateError::NotLoaded {
            adapter: adapter.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        CurateError::DecodeError {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, message: impl Into<String>) -> Self {
        CurateError::IoError {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a move failure error.
    pub fn move_failed(
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
        cause: impl Into<String>,
    ) -> Self {
        CurateError::MoveFailed {
            from: from.as_ref().to_path_buf(),
            to: to.as_ref().to_path_buf(),
            cause: cause.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CurateError::ConfigError {
            message: message.into(),
        }
    }

    /// Whether this error signals misuse of an adapter rather than bad data.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            CurateError::OutOfRange { .. } | CurateError::NotLoaded { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CurateError::UnrecognizedFormat { path } => {
                vec![("path", path.display().to_string())]
            }
            CurateError::MissingMetadata { path, what } => vec![
                ("path", path.display().to_string()),
                ("what", what.clone()),
            ],
            CurateError::OutOfRange { index, length } => vec![
                ("index", index.to_string()),
                ("length", length.to_string()),
            ],
            CurateError::NotLoaded { adapter } => vec![("adapter", adapter.clone())],
            CurateError::DecodeError { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            CurateError::IoError { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            CurateError::MoveFailed { from, to, cause } => vec![
                ("from", from.display().to_string()),
                ("to", to.display().to_string()),
                ("cause", cause.clone()),
            ],
            CurateError::ConfigError { message } => vec![("message", message.clone())],
            CurateError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for CurateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurateError::UnrecognizedFormat { path } => {
                write!(f, "Unrecognized dataset format: '{}'", path.display())
            }
            CurateError::MissingMetadata { path, what } => {
                write!(f, "Missing metadata in '{}': {what}", path.display())
            }
            CurateError::OutOfRange { index, length } => {
                write!(f, "Frame index {index} out of range (length: {length})")
            }
            CurateError::NotLoaded { adapter } => {
                write!(f, "{adapter} used before a successful load")
            }
            CurateError::DecodeError { context, message } => {
                write!(f, "{context} decode error: {message}")
            }
            CurateError::IoError { context, message } => {
                write!(f, "{context} I/O error: {message}")
            }
            CurateError::MoveFailed { from, to, cause } => write!(
                f,
                "Failed to move '{}' to '{}': {cause}",
                from.display(),
                to.display()
            ),
            CurateError::ConfigError { message } => write!(f, "Configuration error: {message}"),
            CurateError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for CurateError {}

impl From<std::io::Error> for CurateError {
    fn from(err: std::io::Error) -> Self {
        CurateError::IoError {
            context: "IO".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for robocurate operations.
pub type Result<T> = std::result::Result<T, CurateError>;
