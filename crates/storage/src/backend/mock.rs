//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::{FileInfo, StorageBackend};
use crate::error::{ErrorKind, Result};
use crate::name::validate as validate_name;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

type RenameFault = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// In-memory storage backend for testing.
///
/// Files are stored in a sorted map behind a [`RwLock`], so listing order is
/// alphabetical and deterministic. Renames can be made to fail on demand
/// with [`fail_renames`](Self::fail_renames) to exercise rollback paths.
///
/// # Examples
///
/// ```
/// use retitle_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backend = MockBackend::with_files([("cat.jpg", b"meow")]);
/// assert!(backend.exists("cat.jpg").await.unwrap());
///
/// backend.rename("cat.jpg", "Sleepy_Cat_DESC.jpg").await.unwrap();
/// assert!(backend.exists("Sleepy_Cat_DESC.jpg").await.unwrap());
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<String, Vec<u8>>>,
    rename_fault: Option<RenameFault>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any name fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (name, data) in files {
            let name = name.into();
            if validate_name(&name).is_err() {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid name {name:?}");
            }
            map.insert(name, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            rename_fault: None,
        }
    }

    /// Make every rename for which `fault(from, to)` returns `true` fail with
    /// a [`PermissionDenied`](ErrorKind::PermissionDenied) error, leaving the
    /// files untouched.
    pub fn fail_renames(mut self, fault: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        self.rename_fault = Some(Box::new(fault));
        self
    }

    /// Sorted snapshot of the current file names.
    pub async fn names(&self) -> Vec<String> {
        self.storage.read().await.keys().cloned().collect()
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            // Snapshot entries under the read lock, then drop it before
            // yielding to avoid holding the lock across yield points.
            let entries: Vec<(String, u64)> = {
                let guard = self.storage.read().await;
                guard.iter().map(|(name, data)| (name.clone(), data.len() as u64)).collect()
            };
            for (name, size) in entries {
                yield Ok(FileInfo::new(name, size));
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        Ok(self.storage.read().await.contains_key(name))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        let data = self.storage.read().await.get(name).cloned();
        data.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(name.to_string())))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = validate_name(from)?;
        let to = validate_name(to)?;
        if let Some(fault) = &self.rename_fault
            && fault(from, to)
        {
            exn::bail!(ErrorKind::PermissionDenied(from.to_string()));
        }
        let mut guard = self.storage.write().await;
        if guard.contains_key(to) {
            exn::bail!(ErrorKind::AlreadyExists(to.to_string()));
        }
        let data = guard.remove(from).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from.to_string())))?;
        guard.insert(to.to_string(), data);
        Ok(())
    }
}
