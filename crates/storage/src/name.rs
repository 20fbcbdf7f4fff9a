//! File name validation.
//!
//! The storage root is a single flat directory, so every name handed to a
//! backend must be exactly one normal path component.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path};

/// Validates a file name for use inside the storage directory.
///
/// # Returns
/// Returns the name unchanged if valid, or [`InvalidName`](crate::error::ErrorKind::InvalidName)
/// if invalid.
///
/// # Examples
///
/// ```
/// use retitle_storage::validate_name;
/// assert!(validate_name("cat.jpg").is_ok());
/// assert!(validate_name("Red_Sunset_DESC_1.png").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("sub/cat.jpg").is_err());
/// assert!(validate_name("a\0b").is_err());
/// ```
pub fn validate(name: &str) -> Result<&str> {
    // Null bytes pass through Path::components() on Unix but cause
    // truncation in C-based syscalls, reject them explicitly.
    if name.contains('\0') || name.contains('/') || name.contains('\\') {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(validate("simple.png").unwrap(), "simple.png");
        assert_eq!(validate("temp_retry_ab12cd34.jpg").unwrap(), "temp_retry_ab12cd34.jpg");
        assert_eq!(validate("with space.webp").unwrap(), "with space.webp");
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", ".", "..", "/", "a/b.jpg", "../escape.jpg", "a\\b.jpg", "nul\0.jpg"] {
            let err = validate(name).unwrap_err();
            assert!(matches!(&*err, ErrorKind::InvalidName(_)), "{name:?} should be rejected");
        }
    }
}
