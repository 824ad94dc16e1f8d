// src/lib.rs
//! Clipboard history engine: polls the system clipboard, records each
//! distinct text, image or file value, and writes past entries back.
pub mod clipboard;
pub mod config;
pub mod history;
pub mod telemetry;

use clipboard::backend::{shared, ClipboardBackend};
use clipboard::watcher::ClipboardWatcher;
use clipboard::writer::ClipboardWriter;
use config::AppConfig;
use history::activation::ClipboardHistoryService;
use history::store::SharedHistory;

/// A watcher and the service a presentation layer uses, wired to one backend
/// and one history.
pub struct ClipKeep {
    pub watcher: ClipboardWatcher,
    pub service: ClipboardHistoryService,
}

impl ClipKeep {
    pub fn new<B: ClipboardBackend + 'static>(backend: B, config: &AppConfig) -> Self {
        let backend = shared(backend);
        let history = SharedHistory::with_config(config.history.clone());
        let watcher = ClipboardWatcher::new(backend.clone(), history.clone(), config.watcher.clone());
        let service = ClipboardHistoryService::new(
            history,
            ClipboardWriter::new(backend),
            watcher.event_sender(),
            config.feedback.clone(),
        );

        Self { watcher, service }
    }
}
