//! Error types for the [`batch`](super) module.

use derive_more::{Display, Error};

/// A batch error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a whole batch failed. Every file in a failed batch goes to recovery.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to send.
    #[display("empty batch")]
    Empty,
    /// Transient failures on every attempt.
    #[display("gave up after {attempts} attempts")]
    Exhausted {
        #[error(not(source))]
        attempts: usize,
    },
    /// The reply did not match the requested schema. Not retried.
    #[display("unparsable batch response")]
    Schema,
    /// The service refused the request. Not retried.
    #[display("batch request rejected")]
    Rejected,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
