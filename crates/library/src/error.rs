//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Each flow ([`batch`](crate::batch),
//! [`recover`](crate::recover), [`rename`](crate::rename)) raises its own
//! error kind; public entry points wrap it in one of these.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not list eligible files")]
    Scan,
    #[display("could not load image")]
    Load,
    #[display("image description failed")]
    Describe,
    #[display("could not rename file")]
    Rename,
    #[display("batch description failed")]
    Batch,
    #[display("single-file recovery failed")]
    Recover,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
