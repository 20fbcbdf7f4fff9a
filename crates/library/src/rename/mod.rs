//! Conflict-resolving renames.
//!
//! A title becomes `<sanitized title><marker><ext>`. When that name is taken
//! the counter suffix `_1`, `_2`, ... is appended until a free name turns up;
//! an existing file is never overwritten. Only the final, free name is ever
//! passed to [`StorageBackend::rename`](retitle_storage::StorageBackend::rename).

pub mod error;

use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::rename::error::{ErrorKind, Result};
use crate::sanitize_title;
use exn::ResultExt;
use retitle_storage::error::ErrorKind as StorageErrorKind;
use retitle_storage::{BackendHandle, split_extension};
use std::ops::Deref;

/// Highest counter suffix tried before giving up with [`ErrorKind::Exhausted`].
const MAX_COUNTER: usize = 10_000;

/// The outcome of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub from: String,
    pub to: String,
    /// Number of occupied names skipped on the way (0 = no conflict).
    pub conflicts: usize,
}

/// Candidate name for a given counter value; `0` means no suffix.
///
/// ```
/// use retitle_library::rename::candidate_name;
/// assert_eq!(candidate_name("Red_Sunset", "_DESC", ".jpg", 0), "Red_Sunset_DESC.jpg");
/// assert_eq!(candidate_name("Red_Sunset", "_DESC", ".jpg", 2), "Red_Sunset_DESC_2.jpg");
/// ```
pub fn candidate_name(base: &str, marker: &str, ext: &str, counter: usize) -> String {
    match counter {
        0 => format!("{base}{marker}{ext}"),
        n => format!("{base}{marker}_{n}{ext}"),
    }
}

/// Renames `from` after `title`, keeping its extension and resolving name
/// conflicts with a counter suffix.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Rename>`](LibraryErrorKind::Rename)
/// raised from an inner [`Exn<ErrorKind>`](ErrorKind). On error `from` is
/// untouched.
pub async fn rename_to_title(backend: &BackendHandle, from: &str, title: &str, marker: &str) -> LibraryResult<Renamed> {
    rename_to_title_inner(backend, from, title, marker).await.or_raise(|| LibraryErrorKind::Rename)
}

pub(crate) async fn rename_to_title_inner(
    backend: &BackendHandle,
    from: &str,
    title: &str,
    marker: &str,
) -> Result<Renamed> {
    let base = sanitize_title(title);
    if base.is_empty() {
        exn::bail!(ErrorKind::EmptyTitle);
    }
    let (_, ext) = split_extension(from);

    for counter in 0..=MAX_COUNTER {
        let candidate = candidate_name(&base, marker, ext, counter);
        if backend.exists(&candidate).await.or_raise(|| ErrorKind::Storage)? {
            continue;
        }
        match backend.rename(from, &candidate).await {
            Ok(()) => {
                tracing::info!(from, to = %candidate, conflicts = counter, "Renamed");
                return Ok(Renamed {
                    from: from.to_string(),
                    to: candidate,
                    conflicts: counter,
                });
            },
            // Something else claimed the name between the check and the
            // rename. Keep counting.
            Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => continue,
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
        }
    }
    exn::bail!(ErrorKind::Exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retitle_storage::backend::MockBackend;
    use std::sync::Arc;

    fn mock(names: &[&str]) -> Arc<MockBackend> {
        Arc::new(MockBackend::with_files(names.iter().map(|n| (n.to_string(), n.as_bytes().to_vec()))))
    }

    #[tokio::test]
    async fn test_rename_without_conflict() {
        let mock = mock(&["IMG_0001.jpg"]);
        let backend: BackendHandle = mock.clone();
        let renamed = rename_to_title(&backend, "IMG_0001.jpg", "Red Sunset", "_DESC").await.unwrap();
        assert_eq!(renamed.to, "Red_Sunset_DESC.jpg");
        assert_eq!(renamed.conflicts, 0);
        assert_eq!(mock.names().await, vec!["Red_Sunset_DESC.jpg"]);
    }

    #[tokio::test]
    async fn test_same_title_twice() {
        let mock = mock(&["a.jpg", "b.jpg"]);
        let backend: BackendHandle = mock.clone();
        let first = rename_to_title(&backend, "a.jpg", "Red Sunset", "_DESC").await.unwrap();
        let second = rename_to_title(&backend, "b.jpg", "Red Sunset", "_DESC").await.unwrap();
        assert_eq!(first.to, "Red_Sunset_DESC.jpg");
        assert_eq!(second.to, "Red_Sunset_DESC_1.jpg");
        assert_eq!(second.conflicts, 1);
        // Contents followed their files.
        assert_eq!(backend.read("Red_Sunset_DESC.jpg").await.unwrap(), b"a.jpg");
        assert_eq!(backend.read("Red_Sunset_DESC_1.jpg").await.unwrap(), b"b.jpg");
    }

    #[tokio::test]
    async fn test_never_overwrites_existing_names() {
        let mock = mock(&["Cat_DESC.png", "Cat_DESC_1.png", "Cat_DESC_2.png", "Cat_DESC_4.png", "new.png", "newer.png"]);
        let backend: BackendHandle = mock.clone();
        let renamed = rename_to_title(&backend, "new.png", "Cat", "_DESC").await.unwrap();
        assert_eq!(renamed.to, "Cat_DESC_3.png");
        assert_eq!(renamed.conflicts, 3);
        let renamed = rename_to_title(&backend, "newer.png", "Cat", "_DESC").await.unwrap();
        assert_eq!(renamed.to, "Cat_DESC_5.png");
        for taken in ["Cat_DESC.png", "Cat_DESC_1.png", "Cat_DESC_2.png", "Cat_DESC_4.png"] {
            assert_eq!(backend.read(taken).await.unwrap(), taken.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_case_sensitive_names() {
        let mock = mock(&["Cat_DESC.png", "new.png"]);
        let backend: BackendHandle = mock.clone();
        let renamed = rename_to_title(&backend, "new.png", "cat", "_DESC").await.unwrap();
        assert_eq!(renamed.to, "cat_DESC.png");
    }

    #[tokio::test]
    async fn test_extension_is_kept() {
        let mock = mock(&["temp_retry_ab12cd34.WEBP"]);
        let backend: BackendHandle = mock.clone();
        let renamed = rename_to_title(&backend, "temp_retry_ab12cd34.WEBP", "Foggy Pier", "_DESC").await.unwrap();
        assert_eq!(renamed.to, "Foggy_Pier_DESC.WEBP");
    }

    #[tokio::test]
    async fn test_empty_title_leaves_file() {
        let mock = mock(&["a.jpg"]);
        let backend: BackendHandle = mock.clone();
        let err = rename_to_title_inner(&backend, "a.jpg", "?!", "_DESC").await.unwrap_err();
        assert_eq!(*err, ErrorKind::EmptyTitle);
        assert_eq!(mock.names().await, vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_file() {
        let mock = Arc::new(MockBackend::with_files([("a.jpg", b"x")]).fail_renames(|_, _| true));
        let backend: BackendHandle = mock.clone();
        let err = rename_to_title_inner(&backend, "a.jpg", "Anything", "_DESC").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Storage);
        assert_eq!(mock.names().await, vec!["a.jpg"]);
    }
}
