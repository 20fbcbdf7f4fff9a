//! Batch image renaming driven by model-generated titles.
//!
//! The pipeline has two tiers:
//!
//! 1. **Batches.** Eligible images are sent to the [`Describer`] in groups of
//!    [`Context::batch_size`]. Every title that comes back is sanitized and
//!    applied with the conflict-resolving [`rename`] step.
//! 2. **Recovery.** Anything the batch tier could not rename (unreadable
//!    image, missing result, failed request, failed rename) is retried one
//!    file at a time by [`recover_file`], which isolates the file under a
//!    temporary name and rolls back on failure.
//!
//! [`process`] drives both tiers over a directory and streams
//! [`ProcessEvent`]s as it goes.
//!
//! [`Describer`]: retitle_describe::Describer

pub mod batch;
pub mod error;
pub mod load;
mod process;
pub mod recover;
pub mod rename;
mod sanitize;
pub mod scan;

pub use crate::process::{DeferReason, FileOutcome, ProcessEvent, Stage, Tally, process};
pub use crate::recover::recover_file;
pub use crate::sanitize::sanitize_title;
use retitle_describe::{BATCH_PROMPT, DescriberHandle};
use std::time::Duration;

/// Token appended to every renamed file; files carrying it are never
/// processed again.
pub const PROCESSED_MARKER: &str = "_DESC";
/// Recognised image extensions (compared case-insensitively, with the dot).
pub const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(5);

/// Everything a run needs, constructed once and passed into every flow.
pub struct Context {
    /// Remote titling capability.
    pub describer: DescriberHandle,
    /// Marker appended to renamed files (see [`PROCESSED_MARKER`]).
    pub marker: String,
    /// Maximum images per batch request. Zero is treated as one.
    pub batch_size: usize,
    /// Instruction sent with every batch.
    pub prompt: String,
    /// Attempts per batch before giving up on transient errors.
    pub max_attempts: usize,
    /// Fixed delay between batch attempts.
    pub retry_delay: Duration,
    /// Pause between consecutive batches, if any.
    pub batch_pause: Option<Duration>,
}
impl Context {
    pub fn new(describer: DescriberHandle) -> Self {
        Self {
            describer,
            marker: PROCESSED_MARKER.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            prompt: BATCH_PROMPT.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            batch_pause: Some(DEFAULT_BATCH_PAUSE),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_retry(mut self, max_attempts: usize, delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = delay;
        self
    }

    pub fn with_batch_pause(mut self, pause: impl Into<Option<Duration>>) -> Self {
        self.batch_pause = pause.into();
        self
    }

    /// Batch size clamped to at least one.
    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
