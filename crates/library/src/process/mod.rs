//! Directory orchestration.
//!
//! [`process`] scans a backend once, runs the batch tier over consecutive
//! batches, collects every file that tier could not rename, and finally runs
//! single-file [recovery](crate::recover) over that set in sorted order.
//! Nothing runs concurrently: one request or one rename at a time.

mod stream;
mod tally;

pub use self::stream::process;
pub use self::tally::Tally;
use crate::recover::Phase;
use std::time::Duration;

/// Progress events emitted by [`process`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    eligible file count.
/// 3. Per batch: [`BatchStarted`](Self::BatchStarted), then one
///    [`File`](Self::File) for each file it renamed or deferred, then
///    [`Paused`](Self::Paused) unless it was the last batch.
/// 4. [`RecoveryStarted`](Self::RecoveryStarted) if anything was deferred,
///    followed by one [`File`](Self::File) per deferred file.
/// 5. [`Complete`](Self::Complete): exactly once, with the final [`Tally`].
///
/// Only a failed directory scan ends the stream early (as an `Err` item,
/// without [`Complete`](Self::Complete)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started,
    DiscoveryComplete(u64),
    BatchStarted {
        /// 1-based batch number.
        index: usize,
        /// Total number of batches.
        count: usize,
        /// Files in this batch.
        files: usize,
    },
    Paused(Duration),
    /// Single-file recovery has begun for this many files.
    RecoveryStarted(u64),
    File(FileOutcome),
    Complete(Tally),
}

/// Which tier renamed a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Batch,
    Recovery,
}

/// Why the batch tier handed a file over to recovery. Reported only: every
/// reason is recovered the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    /// The file could not be read or is not a decodable image.
    Unreadable,
    /// The model's reply had no entry for the file.
    Missing,
    /// The whole batch request failed.
    BatchFailed,
    /// A title came back but the rename failed.
    RenameFailed,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Renamed {
        original: String,
        renamed: String,
        stage: Stage,
        /// Occupied names skipped to find a free one.
        conflicts: usize,
    },
    /// Queued for single-file recovery.
    Deferred { name: String, reason: DeferReason },
    /// Recovery failed and the original name was restored.
    Restored { name: String, phase: Phase },
    /// Recovery failed and so did the rollback: the file is left as `temp`.
    Stranded { original: String, temp: String },
}
