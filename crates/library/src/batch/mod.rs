//! Batch description with bounded retries.
//!
//! One request titles up to [`Context::batch_size`] images. Transient
//! failures (rate limits, timeouts, 5xx) are retried up to
//! [`Context::max_attempts`] times with a fixed [`Context::retry_delay`];
//! a schema violation or a rejected request fails the batch immediately.
//! The result is either the full mapping the model returned or a batch
//! failure: spotting filenames the model left out is the orchestrator's job.

pub mod error;

use crate::Context;
use crate::batch::error::{ErrorKind, Result};
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use exn::ResultExt;
use retitle_describe::error::ErrorKind as DescribeErrorKind;
use retitle_describe::{Descriptions, ImageInput};
use std::ops::Deref;

/// Describes `images` in a single request, retrying transient failures.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Batch>`](LibraryErrorKind::Batch) raised
/// from an inner [`Exn<ErrorKind>`](ErrorKind).
pub async fn describe_batch(ctx: &Context, images: &[ImageInput]) -> LibraryResult<Descriptions> {
    describe_batch_inner(ctx, images).await.or_raise(|| LibraryErrorKind::Batch)
}

#[tracing::instrument(skip_all, fields(images = images.len(), describer = ctx.describer.name()))]
pub(crate) async fn describe_batch_inner(ctx: &Context, images: &[ImageInput]) -> Result<Descriptions> {
    if images.is_empty() {
        exn::bail!(ErrorKind::Empty);
    }
    let attempts = ctx.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match ctx.describer.describe_batch(images, &ctx.prompt).await {
            Ok(descriptions) => {
                tracing::debug!(attempt, titles = descriptions.len(), "Batch described");
                return Ok(descriptions);
            },
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    attempt,
                    attempts,
                    delay = ?ctx.retry_delay,
                    reason = %e.deref(),
                    "Transient batch failure, retrying"
                );
                if !ctx.retry_delay.is_zero() {
                    tokio::time::sleep(ctx.retry_delay).await;
                }
            },
            Err(e) if e.is_retryable() => return Err(e).or_raise(|| ErrorKind::Exhausted { attempts }),
            Err(e) if matches!(e.deref(), DescribeErrorKind::Schema) => return Err(e).or_raise(|| ErrorKind::Schema),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Rejected),
        }
    }
}
