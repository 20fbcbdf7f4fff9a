//! Scriptable in-memory describer for testing.

use crate::error::{ErrorKind, Result};
use crate::{Describer, Descriptions, ImageInput};
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::Mutex;

type BatchHandler = Box<dyn Fn(&[ImageInput]) -> Result<Descriptions> + Send + Sync>;
type SingleHandler = Box<dyn Fn(&ImageInput) -> Result<String> + Send + Sync>;

/// A call received by a [`MockDescriber`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// Filenames of every image in the batch.
    Batch(Vec<String>),
    /// Filename of the single image.
    Single(String),
}

/// In-memory [`Describer`] for testing.
///
/// By default every image is titled after its own file stem, so
/// `IMG_0001.jpg` becomes `IMG_0001`. Replace either behaviour with
/// [`on_batch`](Self::on_batch) / [`on_single`](Self::on_single); every call
/// is recorded and available from [`calls`](Self::calls).
///
/// # Examples
///
/// ```
/// use retitle_describe::{Describer, ImageInput, MockDescriber};
/// use retitle_describe::error::ErrorKind;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mock = MockDescriber::new().on_single(|_| Err(ErrorKind::MissingTitle.into()));
/// let image = ImageInput::new("cat.jpg", "image/jpeg", vec![0u8; 4]);
/// assert!(mock.describe_one(&image).await.is_err());
/// # }
/// ```
pub struct MockDescriber {
    batch: BatchHandler,
    single: SingleHandler,
    calls: Mutex<Vec<MockCall>>,
}

impl MockDescriber {
    pub fn new() -> Self {
        Self {
            batch: Box::new(|images| Ok(images.iter().map(|i| (i.filename.clone(), stem(&i.filename))).collect())),
            single: Box::new(|image| Ok(stem(&image.filename))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the batch behaviour.
    pub fn on_batch(mut self, handler: impl Fn(&[ImageInput]) -> Result<Descriptions> + Send + Sync + 'static) -> Self {
        self.batch = Box::new(handler);
        self
    }

    /// Replaces the single-image behaviour.
    pub fn on_single(mut self, handler: impl Fn(&ImageInput) -> Result<String> + Send + Sync + 'static) -> Self {
        self.single = Box::new(handler);
        self
    }

    /// Every batch request fails with a retryable error.
    pub fn unavailable(self) -> Self {
        self.on_batch(|_| Err(ErrorKind::Transient("HTTP 503".to_string()).into()))
    }

    /// Snapshot of the calls received so far.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }
}
impl Default for MockDescriber {
    fn default() -> Self {
        Self::new()
    }
}

fn stem(filename: &str) -> String {
    Path::new(filename).file_stem().and_then(|s| s.to_str()).unwrap_or(filename).to_string()
}

#[async_trait]
impl Describer for MockDescriber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn describe_batch(&self, images: &[ImageInput], _prompt: &str) -> Result<Descriptions> {
        self.calls.lock().await.push(MockCall::Batch(images.iter().map(|i| i.filename.clone()).collect()));
        (self.batch)(images)
    }

    async fn describe_one(&self, image: &ImageInput) -> Result<String> {
        self.calls.lock().await.push(MockCall::Single(image.filename.clone()));
        (self.single)(image)
    }
}
