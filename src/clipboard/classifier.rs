// src/clipboard/classifier.rs
use super::types::{ClipboardContent, RawClipboardSnapshot};
use log::debug;

/// Turns a raw snapshot into typed content.
///
/// A single copy often exposes several representations at once (rich text
/// also offers plain text, a file copied in a file manager may also offer its
/// icon as a bitmap). The order is fixed: plain text, then bitmap, then the
/// file-path list. The first representation that is present and decodes wins.
#[derive(Clone, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, snapshot: &RawClipboardSnapshot) -> Option<ClipboardContent> {
        if let Some(text) = snapshot.text() {
            if !text.is_empty() {
                return Some(ClipboardContent::Text(text.to_string()));
            }
        }

        if let Some(image) = snapshot.bitmap() {
            if image.is_well_formed() {
                return Some(ClipboardContent::Image(image.clone()));
            }
            debug!(
                "Bitmap representation rejected: {}x{} with {} bytes",
                image.width,
                image.height,
                image.bytes.len()
            );
        }

        if let Some(paths) = snapshot.file_list() {
            if let Some(path) = first_path(paths) {
                return Some(ClipboardContent::FileReference(path));
            }
        }

        None
    }
}

// Entries may arrive as `text/uri-list` lines: comments start with '#',
// and `file://` URIs are percent-encoded.
fn first_path(entries: &[String]) -> Option<String> {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .find_map(normalize_path)
}

pub(crate) fn normalize_path(entry: &str) -> Option<String> {
    let Some(rest) = entry.strip_prefix("file://") else {
        return Some(entry.to_string());
    };

    // file://localhost/path and file:///path both name a local path.
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    match urlencoding::decode(rest) {
        Ok(decoded) if !decoded.is_empty() => Some(decoded.into_owned()),
        Ok(_) => None,
        Err(e) => {
            debug!("File URI is not valid UTF-8 after decoding: {} ({})", entry, e);
            None
        }
    }
}
