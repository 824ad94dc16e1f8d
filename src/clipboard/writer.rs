// src/clipboard/writer.rs
use super::backend::SharedBackend;
use super::types::{ClipboardContent, ClipboardError, ClipboardItem, ImageData, Representation};

use log::{debug, warn};
use std::sync::PoisonError;

/// Puts a history item back on the clipboard in its native format.
#[derive(Clone)]
pub struct ClipboardWriter {
    backend: SharedBackend,
}

impl ClipboardWriter {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Clears the clipboard and sets exactly one representation for `item`.
    ///
    /// The watcher's next tick sees the written value like any other copy;
    /// writing the current most-recent item back therefore records nothing.
    pub fn write(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        let representation = encode(&item.content)?;

        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        match backend.clear_and_set(representation) {
            Ok(()) => {
                debug!("Wrote {:?} item {} back to the clipboard", item.content.kind(), item.id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to write item {} to the clipboard: {}", item.id, e);
                Err(e)
            }
        }
    }
}

/// Native representation for a content value.
pub fn encode(content: &ClipboardContent) -> Result<Representation, ClipboardError> {
    match content {
        ClipboardContent::Text(text) => Ok(Representation::Text(text.clone())),
        ClipboardContent::Image(image) => {
            let rgba = image.to_rgba().ok_or_else(|| {
                ClipboardError::EncodingFailed(format!(
                    "{}x{} image with {} bytes is not an RGBA raster",
                    image.width,
                    image.height,
                    image.bytes.len()
                ))
            })?;
            let (width, height) = rgba.dimensions();
            Ok(Representation::Bitmap(ImageData::new(
                width as usize,
                height as usize,
                rgba.into_raw(),
            )))
        }
        ClipboardContent::FileReference(path) => {
            if path.is_empty() {
                return Err(ClipboardError::EncodingFailed("empty file path".to_string()));
            }
            Ok(Representation::FileList(vec![path.clone()]))
        }
    }
}
