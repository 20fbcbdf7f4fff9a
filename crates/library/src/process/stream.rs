use crate::batch::describe_batch_inner;
use crate::error::Result as LibraryResult;
use crate::load::load_image;
use crate::process::{DeferReason, FileOutcome, ProcessEvent, Stage, Tally};
use crate::recover::error::ErrorKind as RecoverErrorKind;
use crate::recover::recover_file_inner;
use crate::rename::rename_to_title_inner;
use crate::scan::eligible_files;
use crate::Context;
use async_stream::stream;
use futures::Stream;
use retitle_storage::BackendHandle;
use std::collections::BTreeSet;

/// Streams [`ProcessEvent`]s while renaming every eligible image in
/// `backend`.
///
/// The stream is lazy: nothing is scanned until it is first polled. It is
/// finite and cannot be restarted. Per-file failures never end it; they are
/// reported as [`FileOutcome`]s and counted in the final [`Tally`].
pub fn process<'a>(
    backend: &'a BackendHandle,
    ctx: &'a Context,
) -> impl Stream<Item = LibraryResult<ProcessEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ProcessEvent::Started);

        let files = match eligible_files(backend, &ctx.marker).await {
            Ok(f) => f,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        let mut tally = Tally::new(u64::try_from(files.len()).unwrap_or(0));
        yield Ok(ProcessEvent::DiscoveryComplete(tally.eligible));

        let mut deferred: BTreeSet<String> = BTreeSet::new();
        let batch_size = ctx.effective_batch_size();
        let count = files.len().div_ceil(batch_size);

        for (i, batch) in files.chunks(batch_size).enumerate() {
            yield Ok(ProcessEvent::BatchStarted { index: i + 1, count, files: batch.len() });

            let mut images = Vec::with_capacity(batch.len());
            for name in batch {
                match load_image(backend, name).await {
                    Ok(image) => images.push(image),
                    Err(e) => {
                        tracing::warn!(file = %name, error = ?e, "Unreadable image, deferring to recovery");
                        deferred.insert(name.clone());
                        yield Ok(defer(name, DeferReason::Unreadable));
                    },
                }
            }

            if !images.is_empty() {
                match describe_batch_inner(ctx, &images).await {
                    Ok(descriptions) => {
                        for image in &images {
                            let name = &image.filename;
                            let Some(title) = descriptions.get(name) else {
                                tracing::warn!(file = %name, "No title in batch reply, deferring to recovery");
                                deferred.insert(name.clone());
                                yield Ok(defer(name, DeferReason::Missing));
                                continue;
                            };
                            match rename_to_title_inner(backend, name, title, &ctx.marker).await {
                                Ok(renamed) => {
                                    tally.batch_renamed += 1;
                                    yield Ok(ProcessEvent::File(FileOutcome::Renamed {
                                        original: renamed.from,
                                        renamed: renamed.to,
                                        stage: Stage::Batch,
                                        conflicts: renamed.conflicts,
                                    }));
                                },
                                Err(e) => {
                                    tracing::warn!(file = %name, error = ?e, "Rename failed, deferring to recovery");
                                    deferred.insert(name.clone());
                                    yield Ok(defer(name, DeferReason::RenameFailed));
                                },
                            }
                        }
                    },
                    Err(e) => {
                        tracing::error!(batch = i + 1, files = images.len(), error = ?e, "Batch failed, deferring all files");
                        for image in &images {
                            deferred.insert(image.filename.clone());
                            yield Ok(defer(&image.filename, DeferReason::BatchFailed));
                        }
                    },
                }
            }

            let pause = ctx.batch_pause.filter(|p| !p.is_zero() && i + 1 < count);
            if let Some(pause) = pause {
                yield Ok(ProcessEvent::Paused(pause));
                tokio::time::sleep(pause).await;
            }
        }

        if !deferred.is_empty() {
            yield Ok(ProcessEvent::RecoveryStarted(u64::try_from(deferred.len()).unwrap_or(0)));
        }
        for name in deferred {
            let outcome = match recover_file_inner(backend, ctx, &name).await {
                Ok(recovered) => {
                    tally.retry_renamed += 1;
                    FileOutcome::Renamed {
                        original: recovered.original,
                        renamed: recovered.renamed.to,
                        stage: Stage::Recovery,
                        conflicts: recovered.renamed.conflicts,
                    }
                },
                Err(e) => {
                    tally.failed += 1;
                    match &*e {
                        RecoverErrorKind::Failed(phase) => FileOutcome::Restored { name, phase: *phase },
                        RecoverErrorKind::Stranded { temp } => {
                            tally.stranded += 1;
                            FileOutcome::Stranded { original: name, temp: temp.clone() }
                        },
                    }
                },
            };
            yield Ok(ProcessEvent::File(outcome));
        }

        tracing::info!(
            eligible = tally.eligible,
            batch = tally.batch_renamed,
            retry = tally.retry_renamed,
            failed = tally.failed,
            "Processing complete"
        );
        debug_assert!(tally.is_balanced(), "{tally:?}");
        yield Ok(ProcessEvent::Complete(tally));
    })
}

fn defer(name: &str, reason: DeferReason) -> ProcessEvent {
    ProcessEvent::File(FileOutcome::Deferred { name: name.to_string(), reason })
}
