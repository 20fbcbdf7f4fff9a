//! Application Error Types

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings could not be loaded or are incomplete.
    #[display("configuration error")]
    Config,
    /// The storage backend or model client could not be created.
    #[display("setup failed")]
    Setup,
    /// The run ended before completing.
    #[display("processing failed")]
    Run,
}
