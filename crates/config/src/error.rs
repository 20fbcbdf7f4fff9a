//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A config error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The layered sources could not be combined into a [`Config`](crate::Config),
    /// e.g. a non-numeric `RETITLE_BATCH_SIZE`.
    #[display("invalid configuration")]
    Extract,
    /// The settings file could not be written.
    #[display("could not write {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The directory to process does not exist or is not a directory.
    #[display("not a directory: {}", _0.display())]
    InvalidDirectory(#[error(not(source))] PathBuf),
    /// No API key was configured.
    #[display("no API key configured")]
    MissingApiKey,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
