//! Error types for the [`rename`](super) module.

use derive_more::{Display, Error};

/// A rename error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for rename operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a rename failure. In every case the source file
/// is left where it was.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The title sanitized down to nothing.
    #[display("title has no usable characters")]
    EmptyTitle,
    /// A storage backend operation (exists, rename) failed.
    #[display("storage operation failed")]
    Storage,
    /// Every candidate name up to the counter limit was taken.
    #[display("no free name found")]
    Exhausted,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
