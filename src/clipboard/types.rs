// src/clipboard/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Comparison key shared by every image under [`ImageKeyPolicy::Placeholder`].
pub const IMAGE_PLACEHOLDER_KEY: &str = "Image";

/// Thumbnails never exceed this height; width follows the aspect ratio.
pub const THUMBNAIL_MAX_HEIGHT: u32 = 100;

const LABEL_MAX_LEN: usize = 100;

/// RGBA8 raster, four bytes per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// One format the OS clipboard exposes its current value in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Text(String),
    Bitmap(ImageData),
    FileList(Vec<String>),
}

/// Everything the clipboard offered at one instant. An empty snapshot is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClipboardSnapshot {
    pub representations: Vec<Representation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardContent {
    Text(String),
    Image(ImageData),
    FileReference(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
    File,
}

/// How images take part in deduplication.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageKeyPolicy {
    /// Every image shares [`IMAGE_PLACEHOLDER_KEY`].
    #[default]
    Placeholder,
    /// SHA-256 over dimensions and pixels.
    ContentHash,
}

/// One history record. Owned by the history store; consumers get clones.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardItem {
    pub id: String,
    pub content: ClipboardContent,
    pub captured_at: DateTime<Utc>,
    pub comparison_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Presentation-neutral description of an item: what to draw, not how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPreview {
    Text {
        text: String,
    },
    Image {
        width: usize,
        height: usize,
        thumbnail: Option<Thumbnail>,
    },
    File {
        path: String,
        file_name: String,
    },
}

/// Read-only, serialisable view of a [`ClipboardItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub kind: ContentKind,
    pub captured_at: DateTime<Utc>,
    pub label: String,
    pub preview: ContentPreview,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard service unavailable: {0}")]
    ClipboardUnavailable(String),
    #[error("Failed to encode clipboard content: {0}")]
    EncodingFailed(String),
    #[error("No history item with id {0}")]
    ItemNotFound(String),
}

impl ImageData {
    pub fn new(width: usize, height: usize, bytes: Vec<u8>) -> Self {
        Self { width, height, bytes }
    }

    /// Non-empty and the buffer holds exactly `width * height` RGBA pixels.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .width
                .checked_mul(self.height)
                .and_then(|px| px.checked_mul(4))
                == Some(self.bytes.len())
    }

    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.width as u64).to_le_bytes());
        hasher.update((self.height as u64).to_le_bytes());
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn to_rgba(&self) -> Option<image::RgbaImage> {
        if !self.is_well_formed() {
            return None;
        }
        let width = u32::try_from(self.width).ok()?;
        let height = u32::try_from(self.height).ok()?;
        image::RgbaImage::from_raw(width, height, self.bytes.clone())
    }

    pub fn thumbnail(&self, max_height: u32) -> Option<Thumbnail> {
        let rgba = self.to_rgba()?;
        let (width, height) = rgba.dimensions();
        if height <= max_height {
            return Some(Thumbnail {
                width,
                height,
                rgba: rgba.into_raw(),
            });
        }

        let scaled_width = ((u64::from(width) * u64::from(max_height)) / u64::from(height)).max(1);
        let scaled = image::imageops::thumbnail(&rgba, scaled_width as u32, max_height);
        Some(Thumbnail {
            width: scaled.width(),
            height: scaled.height(),
            rgba: scaled.into_raw(),
        })
    }
}

impl RawClipboardSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, representation: Representation) -> Self {
        self.representations.push(representation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }

    pub fn text(&self) -> Option<&str> {
        self.representations.iter().find_map(|rep| match rep {
            Representation::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn bitmap(&self) -> Option<&ImageData> {
        self.representations.iter().find_map(|rep| match rep {
            Representation::Bitmap(image) => Some(image),
            _ => None,
        })
    }

    pub fn file_list(&self) -> Option<&[String]> {
        self.representations.iter().find_map(|rep| match rep {
            Representation::FileList(paths) => Some(paths.as_slice()),
            _ => None,
        })
    }
}

impl From<Representation> for RawClipboardSnapshot {
    fn from(representation: Representation) -> Self {
        Self::empty().with(representation)
    }
}

impl ClipboardContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            ClipboardContent::Text(_) => ContentKind::Text,
            ClipboardContent::Image(_) => ContentKind::Image,
            ClipboardContent::FileReference(_) => ContentKind::File,
        }
    }

    pub fn comparison_key(&self, image_policy: ImageKeyPolicy) -> String {
        match self {
            ClipboardContent::Text(text) => text.clone(),
            ClipboardContent::Image(image) => match image_policy {
                ImageKeyPolicy::Placeholder => IMAGE_PLACEHOLDER_KEY.to_string(),
                ImageKeyPolicy::ContentHash => format!("image:{}", image.content_hash()),
            },
            ClipboardContent::FileReference(path) => path.clone(),
        }
    }

    pub fn preview(&self) -> ContentPreview {
        match self {
            ClipboardContent::Text(text) => ContentPreview::Text { text: text.clone() },
            ClipboardContent::Image(image) => ContentPreview::Image {
                width: image.width,
                height: image.height,
                thumbnail: image.thumbnail(THUMBNAIL_MAX_HEIGHT),
            },
            ClipboardContent::FileReference(path) => ContentPreview::File {
                path: path.clone(),
                file_name: file_name_of(path),
            },
        }
    }

    /// Short human-readable description for log lines.
    pub fn summary(&self) -> String {
        match self {
            ClipboardContent::Text(text) => safe_truncate(text, 50),
            ClipboardContent::Image(image) => format!("{}x{} image", image.width, image.height),
            ClipboardContent::FileReference(path) => path.clone(),
        }
    }
}

impl ContentPreview {
    pub fn label(&self) -> String {
        match self {
            ContentPreview::Text { text } => safe_truncate(text, LABEL_MAX_LEN),
            ContentPreview::Image { width, height, .. } => format!("Image ({}x{})", width, height),
            ContentPreview::File { file_name, .. } => format!("File: {}", file_name),
        }
    }
}

impl ClipboardItem {
    pub fn new(content: ClipboardContent, comparison_key: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            captured_at: Utc::now(),
            comparison_key,
        }
    }

    pub fn view(&self) -> ItemView {
        let preview = self.content.preview();
        ItemView {
            id: self.id.clone(),
            kind: self.content.kind(),
            captured_at: self.captured_at,
            label: preview.label(),
            preview,
        }
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// Cuts on a char boundary so multi-byte text never panics.
pub fn safe_truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    if end == 0 {
        return String::new();
    }

    format!("{}...", &s[..end])
}
