//! Unified error types for the oscontainer workspace.
//!
//! These errors never reach callers of the public query API. Readers
//! classify them with [`OsContainerError::class`] and fold them into the
//! sentinel value of the field they were reading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum OsContainerError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A file was read but its content could not be interpreted.
    #[error("malformed content in {path}: {message}")]
    Parse {
        /// File holding the malformed content.
        path: PathBuf,
        /// Description of what failed to parse.
        message: String,
    },

    /// The running platform or kernel lacks the requested facility.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Description of the missing facility.
        message: String,
    },
}

/// Coarse classification of a detection failure.
///
/// Both classes end up as the same sentinel value; the class only decides
/// how loudly the failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The signal does not exist here: missing file, denied access, non-Linux.
    Unavailable,
    /// The signal exists but its content is not what the kernel documents.
    Malformed,
}

impl OsContainerError {
    /// Builds an [`OsContainerError::Parse`] for `path`.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classifies this error as an unavailable or malformed signal.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Io { source, .. } if source.kind() == io::ErrorKind::InvalidData => {
                ErrorClass::Malformed
            }
            Self::Io { .. } | Self::Unsupported { .. } => ErrorClass::Unavailable,
            Self::Parse { .. } => ErrorClass::Malformed,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, OsContainerError>;
