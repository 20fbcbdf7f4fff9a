//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Rename destination is already taken
    #[display("file already exists: {_0}")]
    AlreadyExists(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Name is empty, contains a separator, or would leave the directory
    #[display("invalid file name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// Backend root is not an absolute path to an existing directory
    #[display("invalid directory: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
