//! Single-file recovery with rollback.
//!
//! A file the batch tier could not rename gets one more, isolated attempt:
//!
//! 1. **Isolating**: rename to `temp_retry_<8 hex><ext>`. If this fails,
//!    nothing moved and there is nothing to undo.
//! 2. **Requesting**: load the temporary file and ask for a single title
//!    (one attempt, no retry loop).
//! 3. **Renaming**: apply the conflict-resolving [`rename`](crate::rename)
//!    from the temporary name.
//!
//! If step 2 or 3 fails the temporary file is renamed back to its original
//! name. If *that* fails the file is [`Stranded`](ErrorKind::Stranded).

pub mod error;

pub use self::error::Phase;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::load::load_image;
use crate::recover::error::{ErrorKind, Result};
use crate::rename::{Renamed, rename_to_title_inner};
use crate::{Context, sanitize_title};
use exn::ResultExt;
use retitle_storage::{BackendHandle, split_extension};
use uuid::Uuid;

const TEMP_PREFIX: &str = "temp_retry_";
/// Fresh temporary names tried before isolation gives up.
const MAX_TEMP_ATTEMPTS: usize = 8;

/// A file recovered under its new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub original: String,
    /// Temporary name the file was isolated under.
    pub temp: String,
    pub renamed: Renamed,
}

/// Runs the recovery flow for `name`.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Recover>`](LibraryErrorKind::Recover)
/// raised from an inner [`Exn<ErrorKind>`](ErrorKind); inspect the inner kind
/// to tell a restored file from a stranded one.
pub async fn recover_file(backend: &BackendHandle, ctx: &Context, name: &str) -> LibraryResult<Recovered> {
    recover_file_inner(backend, ctx, name).await.or_raise(|| LibraryErrorKind::Recover)
}

#[tracing::instrument(skip(backend, ctx))]
pub(crate) async fn recover_file_inner(backend: &BackendHandle, ctx: &Context, name: &str) -> Result<Recovered> {
    let temp = isolate(backend, name).await?;
    tracing::debug!(temp = %temp, "Isolated");

    let (phase, cause) = match title_and_rename(backend, ctx, &temp).await {
        Ok(renamed) => {
            return Ok(Recovered {
                original: name.to_string(),
                temp,
                renamed,
            });
        },
        Err(failure) => failure,
    };

    match backend.rename(&temp, name).await {
        Ok(()) => {
            tracing::warn!(phase = %phase, cause = ?cause, "Recovery failed, original name restored");
            Err(cause.raise(ErrorKind::Failed(phase)))
        },
        Err(rollback) => {
            tracing::error!(
                temp = %temp,
                phase = %phase,
                cause = ?cause,
                rollback = ?rollback,
                "Rollback failed, file must be renamed back by hand"
            );
            Err(rollback.raise(ErrorKind::Stranded { temp }))
        },
    }
}

async fn isolate(backend: &BackendHandle, name: &str) -> Result<String> {
    let (_, ext) = split_extension(name);
    for _ in 0..MAX_TEMP_ATTEMPTS {
        let temp = temp_name(ext);
        if backend.exists(&temp).await.or_raise(|| ErrorKind::Failed(Phase::Isolating))? {
            continue;
        }
        backend.rename(name, &temp).await.or_raise(|| ErrorKind::Failed(Phase::Isolating))?;
        return Ok(temp);
    }
    exn::bail!(ErrorKind::Failed(Phase::Isolating))
}

/// Requesting and Renaming. Errors carry the phase they happened in so the
/// caller can roll back and report it.
async fn title_and_rename(
    backend: &BackendHandle,
    ctx: &Context,
    temp: &str,
) -> std::result::Result<Renamed, (Phase, exn::Exn<LibraryErrorKind>)> {
    let requesting = |e: exn::Exn<_>| (Phase::Requesting, e);

    let image = load_image(backend, temp).await.map_err(requesting)?;
    let title = ctx.describer.describe_one(&image).await.or_raise(|| LibraryErrorKind::Describe).map_err(requesting)?;
    if sanitize_title(&title).is_empty() {
        tracing::debug!(title = %title, "Title has no usable characters");
        return Err(requesting(exn::Exn::from(LibraryErrorKind::Describe)));
    }

    rename_to_title_inner(backend, temp, &title, &ctx.marker)
        .await
        .or_raise(|| LibraryErrorKind::Rename)
        .map_err(|e| (Phase::Renaming, e))
}

fn temp_name(ext: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{TEMP_PREFIX}{}{ext}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::tests::png;
    use retitle_describe::MockDescriber;
    use retitle_describe::error::ErrorKind as DescribeErrorKind;
    use retitle_storage::backend::MockBackend;
    use std::sync::Arc;

    fn setup(backend: MockBackend, describer: MockDescriber) -> (Arc<MockBackend>, BackendHandle, Context) {
        let mock = Arc::new(backend);
        let handle: BackendHandle = mock.clone();
        (mock, handle, Context::new(Arc::new(describer)))
    }

    #[test]
    fn test_temp_name_shape() {
        let name = temp_name(".jpg");
        assert!(name.starts_with(TEMP_PREFIX) && name.ends_with(".jpg"));
        let id = &name[TEMP_PREFIX.len()..name.len() - 4];
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_recovers_file() {
        let describer = MockDescriber::new().on_single(|_| Ok("Sleepy Tabby Cat".to_string()));
        let (mock, backend, ctx) = setup(MockBackend::with_files([("cat.jpg", png(7))]), describer);
        let recovered = recover_file(&backend, &ctx, "cat.jpg").await.unwrap();
        assert_eq!(recovered.original, "cat.jpg");
        assert!(recovered.temp.starts_with(TEMP_PREFIX));
        assert_eq!(recovered.renamed.from, recovered.temp);
        assert_eq!(recovered.renamed.to, "Sleepy_Tabby_Cat_DESC.jpg");
        assert_eq!(mock.names().await, vec!["Sleepy_Tabby_Cat_DESC.jpg"]);
        assert_eq!(backend.read("Sleepy_Tabby_Cat_DESC.jpg").await.unwrap(), png(7));
    }

    #[tokio::test]
    async fn test_request_failure_restores_original() {
        let describer = MockDescriber::new().on_single(|_| Err(DescribeErrorKind::Transient("HTTP 503".to_string()).into()));
        let (mock, backend, ctx) = setup(MockBackend::with_files([("cat.jpg", png(1))]), describer);
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Requesting));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
        assert_eq!(backend.read("cat.jpg").await.unwrap(), png(1));
    }

    #[tokio::test]
    async fn test_request_sees_temp_name_only() {
        let describer = MockDescriber::new().on_single(|image| {
            assert!(image.filename.starts_with(TEMP_PREFIX), "{}", image.filename);
            Err(DescribeErrorKind::MissingTitle.into())
        });
        let (mock, backend, ctx) = setup(MockBackend::with_files([("cat.jpg", png(1))]), describer);
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Requesting));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
    }

    #[tokio::test]
    async fn test_unusable_title_restores_original() {
        let describer = MockDescriber::new().on_single(|_| Ok("!!!".to_string()));
        let (mock, backend, ctx) = setup(MockBackend::with_files([("cat.jpg", png(1))]), describer);
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Requesting));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
    }

    #[tokio::test]
    async fn test_unreadable_image_restores_original() {
        let (mock, backend, ctx) = setup(MockBackend::with_files([("cat.jpg", b"not an image")]), MockDescriber::new());
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Requesting));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
    }

    #[tokio::test]
    async fn test_rename_failure_restores_original() {
        let backend = MockBackend::with_files([("cat.jpg", png(1))]).fail_renames(|_, to| to.contains("_DESC"));
        let describer = MockDescriber::new().on_single(|_| Ok("Cat".to_string()));
        let (mock, backend, ctx) = setup(backend, describer);
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Renaming));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
    }

    #[tokio::test]
    async fn test_isolation_failure_moves_nothing() {
        let backend = MockBackend::with_files([("cat.jpg", png(1))]).fail_renames(|from, _| from == "cat.jpg");
        let (mock, backend, ctx) = setup(backend, MockDescriber::new());
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Failed(Phase::Isolating));
        assert_eq!(mock.names().await, vec!["cat.jpg"]);
    }

    #[tokio::test]
    async fn test_rollback_failure_strands_file() {
        // Everything out of the temporary name fails: both the final rename
        // and the rollback.
        let backend = MockBackend::with_files([("cat.jpg", png(1))]).fail_renames(|from, _| from.starts_with(TEMP_PREFIX));
        let describer = MockDescriber::new().on_single(|_| Ok("Cat".to_string()));
        let (mock, backend, ctx) = setup(backend, describer);
        let err = recover_file_inner(&backend, &ctx, "cat.jpg").await.unwrap_err();
        let ErrorKind::Stranded { temp } = &*err else {
            panic!("expected stranded, got {err:?}");
        };
        assert!(temp.starts_with(TEMP_PREFIX));
        assert_eq!(mock.names().await, vec![temp.clone()]);
    }
}
