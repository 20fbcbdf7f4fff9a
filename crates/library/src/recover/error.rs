//! Error types for the [`recover`](super) module.

use derive_more::{Display, Error};

/// A recovery error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for recovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The step of single-file recovery that failed.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Moving the file to its temporary name.
    #[display("isolating")]
    Isolating,
    /// Loading the image and asking the model for a title.
    #[display("requesting")]
    Requesting,
    /// Moving the temporary file to its titled name.
    #[display("renaming")]
    Renaming,
}

/// Outcome of a failed recovery.
///
/// ### Ordinary Failure
/// - [`ErrorKind::Failed`]: the file is back under its original name.
///
/// ### Fatal For The File
/// - [`ErrorKind::Stranded`]: the rollback rename failed too, and the file is
///   left under a temporary name that must be restored by hand.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("recovery failed while {_0}")]
    Failed(#[error(not(source))] Phase),
    #[display("rollback failed, file left as {temp}")]
    Stranded {
        #[error(not(source))]
        temp: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
