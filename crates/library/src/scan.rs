//! Discovery of images that still need a descriptive name.

use crate::IMAGE_EXTENSIONS;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use retitle_storage::{BackendHandle, split_extension};

/// Returns `true` for a recognised image extension (case-insensitive) on a
/// name that does not already carry `marker`.
///
/// ```
/// use retitle_library::scan::is_eligible;
/// assert!(is_eligible("IMG_0001.JPG", "_DESC"));
/// assert!(!is_eligible("Red_Sunset_DESC.jpg", "_DESC"));
/// assert!(!is_eligible("notes.txt", "_DESC"));
/// ```
pub fn is_eligible(name: &str, marker: &str) -> bool {
    let (_, ext) = split_extension(name);
    let recognised = IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known));
    recognised && (marker.is_empty() || !name.contains(marker))
}

/// Lists every eligible file in `backend`, in directory listing order.
///
/// The listing is taken once; files appearing later in the run are not
/// picked up.
pub async fn eligible_files(backend: &BackendHandle, marker: &str) -> Result<Vec<String>> {
    let files = backend.list().await.or_raise(|| ErrorKind::Scan)?;
    let total = files.len();
    let (eligible, bytes) = files
        .into_iter()
        .filter(|file| is_eligible(&file.name, marker))
        .fold((Vec::new(), 0u64), |(mut names, bytes), file| {
            names.push(file.name);
            (names, bytes + file.size)
        });
    tracing::debug!(backend = backend.name(), total, eligible = eligible.len(), bytes, "Directory scanned");
    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retitle_storage::backend::MockBackend;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case("cat.jpg", true)]
    #[case("cat.JPEG", true)]
    #[case("cat.png", true)]
    #[case("cat.WebP", true)]
    #[case("temp_retry_ab12cd34.jpg", true)]
    #[case("cat.gif", false)]
    #[case("cat.jpg.txt", false)]
    #[case(".jpg", false)]
    #[case("Red_Sunset_DESC.jpg", false)]
    #[case("Red_Sunset_DESC_1.png", false)]
    #[case("my_DESCRIPTION.png", false)]
    fn test_is_eligible(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_eligible(name, "_DESC"), expected);
    }

    #[tokio::test]
    async fn test_eligible_files() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([
            ("b.png", b"x"),
            ("a.jpg", b"x"),
            ("done_DESC.jpg", b"x"),
            ("readme.md", b"x"),
        ]));
        assert_eq!(eligible_files(&backend, "_DESC").await.unwrap(), vec!["a.jpg", "b.png"]);
    }
}
