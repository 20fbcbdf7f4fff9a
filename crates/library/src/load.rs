//! Reading image files into model inputs.

use crate::error::{ErrorKind, Result};
use ::image::ImageReader;
use exn::{OptionExt, ResultExt};
use retitle_describe::ImageInput;
use retitle_storage::BackendHandle;
use std::io::Cursor;

/// Reads `name` and checks that it is a decodable image.
///
/// The format is sniffed from the content (not the extension) and its header
/// is parsed to get the dimensions; pixel data is not decoded. The returned
/// [`ImageInput`] carries the sniffed MIME type.
pub async fn load_image(backend: &BackendHandle, name: &str) -> Result<ImageInput> {
    let bytes = backend.read(name).await.or_raise(|| ErrorKind::Load)?;
    let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format().or_raise(|| ErrorKind::Load)?;
    let format = reader.format().ok_or_raise(|| ErrorKind::Load)?;
    let (width, height) = reader.into_dimensions().or_raise(|| ErrorKind::Load)?;
    tracing::trace!(file = name, ?format, width, height, "Image loaded");
    Ok(ImageInput::new(name, format.to_mime_type(), bytes))
}
