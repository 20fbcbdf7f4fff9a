//! Storage models.

/// File metadata returned by storage backend listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// File name within the directory (no separators).
    pub name: String,
    /// File size in bytes
    pub size: u64,
}
impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size }
    }
}

/// Splits a file name into its stem and its extension (including the dot).
///
/// ```
/// use retitle_storage::split_extension;
/// assert_eq!(split_extension("cat.jpg"), ("cat", ".jpg"));
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension(".hidden"), (".hidden", ""));
/// assert_eq!(split_extension("README"), ("README", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(i) => name.split_at(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension_keeps_case() {
        assert_eq!(split_extension("Photo.JPEG"), ("Photo", ".JPEG"));
        assert_eq!(split_extension(".webp"), (".webp", ""));
        assert_eq!(split_extension("temp_retry_ab12cd34.png"), ("temp_retry_ab12cd34", ".png"));
    }
}
