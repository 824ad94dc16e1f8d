// src/clipboard/backend.rs
use super::types::{ClipboardError, RawClipboardSnapshot, Representation};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Access to a clipboard service.
///
/// Reads return whatever representations are currently offered. Writes
/// replace the whole clipboard with exactly one representation: no format from
/// the previous value survives.
pub trait ClipboardBackend: Send {
    fn snapshot(&mut self) -> Result<RawClipboardSnapshot, ClipboardError>;
    fn clear_and_set(&mut self, representation: Representation) -> Result<(), ClipboardError>;
}

/// Backend shared between the watcher (reader) and the writer.
pub type SharedBackend = Arc<Mutex<Box<dyn ClipboardBackend>>>;

pub fn shared<B: ClipboardBackend + 'static>(backend: B) -> SharedBackend {
    Arc::new(Mutex::new(Box::new(backend)))
}

/// In-process clipboard. Clones share the same contents, so a test or an
/// embedder can keep one handle to play the user while the watcher owns another.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<RawClipboardSnapshot>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another application putting `snapshot` on the clipboard.
    pub fn put(&self, snapshot: RawClipboardSnapshot) {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn put_text(&self, text: &str) {
        self.put(Representation::Text(text.to_string()).into());
    }

    pub fn current(&self) -> RawClipboardSnapshot {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// While set, every read and write fails with `ClipboardUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ClipboardError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ClipboardError::ClipboardUnavailable(
                "memory clipboard switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn snapshot(&mut self) -> Result<RawClipboardSnapshot, ClipboardError> {
        self.check_available()?;
        Ok(self.current())
    }

    fn clear_and_set(&mut self, representation: Representation) -> Result<(), ClipboardError> {
        self.check_available()?;
        self.put(representation.into());
        Ok(())
    }
}
