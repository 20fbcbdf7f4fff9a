//! Describer Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A describer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for describer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Only [`Transient`](Self::Transient) is worth retrying with the same input.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No API key was configured.
    #[display("missing API credentials")]
    Credentials,
    /// Rate limiting, timeouts, dropped connections and server-side errors.
    #[display("transient remote error: {_0}")]
    Transient(#[error(not(source))] String),
    /// The service refused the request (bad key, payload too large, ...).
    #[display("request rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The request could not be built (invalid endpoint, ...).
    #[display("invalid request")]
    Request,
    /// The response body was not the structured JSON that was asked for.
    #[display("response does not match the requested schema")]
    Schema,
    /// The response was well-formed but carried no title.
    #[display("response contained no title")]
    MissingTitle,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            408 | 429 | 500..=599 => Self::Transient(format!("HTTP {status}")),
            _ => Self::Rejected { status, message: message.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(429, true)]
    #[case(408, true)]
    #[case(500, true)]
    #[case(503, true)]
    #[case(400, false)]
    #[case(401, false)]
    #[case(403, false)]
    #[case(404, false)]
    fn test_status_classification(#[case] status: u16, #[case] retryable: bool) {
        assert_eq!(ErrorKind::from_status(status, "nope").is_retryable(), retryable);
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ErrorKind::Transient("timeout".to_string()).is_retryable());
        assert!(!ErrorKind::Schema.is_retryable());
        assert!(!ErrorKind::MissingTitle.is_retryable());
        assert!(!ErrorKind::Credentials.is_retryable());
        assert!(!ErrorKind::Request.is_retryable());
    }

    #[test]
    fn test_display() {
        let kind = ErrorKind::Rejected { status: 400, message: "API key not valid".to_string() };
        assert_eq!(kind.to_string(), "request rejected with HTTP 400: API key not valid");
    }
}
