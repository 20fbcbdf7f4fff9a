//! Local filesystem storage backend.
//!
//! Operates on one existing directory on the local filesystem via `tokio::fs`
//! for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, name::validate as validate_name};
use async_stream::stream;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum ListEntry {
    File(FileInfo),
    Skip,
}

/// Local filesystem storage backend.
///
/// All names are relative to the configured root directory, which must
/// already exist. The backend never creates directories.
///
/// # Examples
///
/// ```no_run
/// use retitle_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("photos", "/home/me/Pictures/holiday").map_err(|e| format!("{e:?}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRoot`](ErrorKind::InvalidRoot) if the path is not
    /// absolute or is not an existing directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidRoot(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a validated file name.
    fn absolute_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_name(name)?))
    }

    fn map_io_error(e: std::io::Error, name: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(name.to_string()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(name.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Keeps the `?` operator usable for a single directory entry; the
    /// stream loop itself can only yield.
    async fn process_entry(entry: DirEntry) -> Result<ListEntry> {
        let Ok(name) = entry.file_name().into_string() else {
            tracing::debug!(path = %entry.path().display(), "Skipping file with non UTF-8 name");
            return Ok(ListEntry::Skip);
        };
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &name))?;
        // Directories, sockets, and (most likely broken) symlinks are dropped.
        if !metadata.is_file() {
            return Ok(ListEntry::Skip);
        }
        Ok(ListEntry::File(FileInfo::new(name, metadata.len())))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &self.root.display().to_string())));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => { yield Err(exn::Exn::from(ErrorKind::Io(e))); break; },
                };
                match Self::process_entry(entry).await {
                    Ok(ListEntry::File(f)) => yield Ok(f),
                    Ok(ListEntry::Skip) => {},
                    Err(e) => yield Err(e),
                };
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::try_exists(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        // `fs::rename` silently replaces the destination on Unix.
        if fs::try_exists(&to_path).await.map_err(|e| Self::map_io_error(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_string()));
        }
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, from))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn backend_in(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::new("local", dir.path()).unwrap()
    }

    #[test]
    fn test_new_requires_absolute_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", temp_dir.path().join("missing")).is_err());
        std::fs::write(temp_dir.path().join("file.jpg"), b"data").unwrap();
        let err = LocalBackend::new("name", temp_dir.path().join("file.jpg")).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidRoot(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&temp_dir);
        assert_eq!(backend.absolute_path("cat.jpg").unwrap(), temp_dir.path().join("cat.jpg"));
        // Traversal is prevented
        assert!(backend.absolute_path("../etc/passwd").is_err());
        assert!(backend.absolute_path("sub/cat.jpg").is_err());
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.jpg"), b"12345").unwrap();
        std::fs::write(temp_dir.path().join("b.png"), b"1").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.jpg")).unwrap();
        std::fs::write(temp_dir.path().join("nested.jpg").join("c.jpg"), b"1").unwrap();
        let backend = backend_in(&temp_dir);
        let mut files = backend.list().await.unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(files, vec![FileInfo::new("a.jpg", 5), FileInfo::new("b.png", 1)]);
    }

    #[tokio::test]
    async fn test_exists_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&temp_dir);
        assert!(!backend.exists("cat.jpg").await.unwrap());
        std::fs::write(temp_dir.path().join("cat.jpg"), b"meow").unwrap();
        assert!(backend.exists("cat.jpg").await.unwrap());
        assert_eq!(backend.read("cat.jpg").await.unwrap(), b"meow");
        let err = backend.read("dog.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&temp_dir);
        std::fs::write(temp_dir.path().join("old.jpg"), b"data").unwrap();
        backend.rename("old.jpg", "new.jpg").await.unwrap();
        assert!(!backend.exists("old.jpg").await.unwrap());
        assert_eq!(backend.read("new.jpg").await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_rename_never_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&temp_dir);
        std::fs::write(temp_dir.path().join("a.jpg"), b"first").unwrap();
        std::fs::write(temp_dir.path().join("b.jpg"), b"second").unwrap();
        let err = backend.rename("a.jpg", "b.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(backend.read("a.jpg").await.unwrap(), b"first");
        assert_eq!(backend.read("b.jpg").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_rename_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&temp_dir);
        let err = backend.rename("missing.jpg", "new.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
