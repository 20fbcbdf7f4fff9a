//! Image titling through a remote vision-language model.
//!
//! The [`Describer`] trait is the whole contract the rest of retitle relies
//! on: given N images, either return a title addressable by each original
//! filename, or fail as a unit. Given one image, return one title or fail.
//!
//! [`GeminiDescriber`] is the production implementation. It requests
//! schema-constrained JSON so parsing is deterministic: a body that does not
//! match the schema is a [`Schema`](error::ErrorKind::Schema) error, never a
//! partial result.

pub mod error;
mod gemini;
#[cfg(feature = "mock")]
mod mock;

pub use crate::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT, GeminiDescriber};
#[cfg(feature = "mock")]
pub use crate::mock::{MockCall, MockDescriber};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub type DescriberHandle = Arc<dyn Describer + Send + Sync>;

/// Mapping from original filename to generated short title.
pub type Descriptions = HashMap<String, String>;

/// Instruction sent alongside every batch of images.
pub const BATCH_PROMPT: &str = "Analyze the following batch of images. For EACH image, you MUST identify its \
    original filename and generate a concise, descriptive, 3-5 word title suitable for renaming. Return the \
    complete structured JSON array containing the 'original_filename' and 'short_title' for every image in the \
    batch. Ensure the 'original_filename' exactly matches one of the filenames provided in the prompts.";

/// An image ready to be sent to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Name the model should echo back in batch responses.
    pub filename: String,
    /// MIME type of `bytes`, e.g. `image/jpeg`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
impl ImageInput {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// A remote model that can produce short descriptive titles for images.
///
/// Implementations make exactly one remote request per call. Retrying is the
/// caller's decision, guided by [`ErrorKind::is_retryable`](error::ErrorKind::is_retryable).
#[async_trait]
pub trait Describer: Send + Sync {
    /// Human-readable name of the model/backend (used for logging only).
    fn name(&self) -> &str;

    /// Titles every image in `images` with a single multi-image request.
    ///
    /// The returned mapping is keyed by the filenames the model echoed back.
    /// A model may omit entries; detecting that is up to the caller.
    async fn describe_batch(&self, images: &[ImageInput], prompt: &str) -> Result<Descriptions>;

    /// Titles a single image.
    ///
    /// Returns [`MissingTitle`](error::ErrorKind::MissingTitle) if the model
    /// answered without a usable title.
    async fn describe_one(&self, image: &ImageInput) -> Result<String>;
}
