//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface over the one directory retitle operates on. The local
//! filesystem is the real implementation; the in-memory mock exists for tests.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::FileInfo;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All names are bare file names (one path component) relative to the
/// backend's directory, and are validated with
/// [`validate_name`](crate::validate_name) before use. Implementations must
/// enforce this validation.
///
/// The only mutation is [`rename`](Self::rename): no copy, no write, no
/// delete.
///
/// # Examples
///
/// ```
/// use retitle_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_hardcoded_file(backend: &dyn StorageBackend) -> Result<u64> {
///     if backend.exists("cat.jpg").await? {
///         let data = backend.read("cat.jpg").await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend (used for logging only).
    fn name(&self) -> &str;

    /// List all regular files in the directory.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream file metadata for every regular file in the directory, in
    /// directory listing order.
    ///
    /// Subdirectories are not descended into. Entries whose names cannot be
    /// represented as UTF-8 are skipped.
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Check if a file exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Rename a file within the directory.
    ///
    /// # Notes
    /// - Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    ///   file does not exist.
    /// - Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if
    ///   the destination is taken. An existing file is never overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use retitle_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.rename("IMG_0001.jpg", "Red_Sunset_DESC.jpg").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}
