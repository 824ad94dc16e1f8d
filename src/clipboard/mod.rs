// src/clipboard/mod.rs
pub mod types;
pub mod classifier;
pub mod backend;
pub mod system;
pub mod watcher;
pub mod writer;

pub use types::*;
pub use backend::{shared, ClipboardBackend, MemoryClipboard, SharedBackend};
pub use classifier::ContentClassifier;
pub use system::SystemClipboard;
pub use watcher::{ClipboardWatcher, HistoryEvent, TickOutcome, WatcherConfig, WatcherState};
pub use writer::ClipboardWriter;
