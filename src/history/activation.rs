// src/history/activation.rs
use super::store::SharedHistory;
use crate::clipboard::types::{ClipboardError, ClipboardItem, ItemView};
use crate::clipboard::watcher::HistoryEvent;
use crate::clipboard::writer::ClipboardWriter;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedbackConfig {
    pub dismiss_after_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 2000,
        }
    }
}

impl FeedbackConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Succeeded,
    Failed(String),
}

/// Transient result indicator for one activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationFeedback {
    pub item_id: String,
    pub outcome: ActivationOutcome,
    pub shown_at: DateTime<Utc>,
    pub dismiss_after: Duration,
}

impl ActivationFeedback {
    pub fn is_success(&self) -> bool {
        self.outcome == ActivationOutcome::Succeeded
    }

    /// True until `dismiss_after` has elapsed since `shown_at`.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.shown_at).to_std() {
            Ok(elapsed) => elapsed < self.dismiss_after,
            // `now` before `shown_at`
            Err(_) => true,
        }
    }
}

/// What a presentation layer talks to: the history to render and the
/// activate-item operation.
pub struct ClipboardHistoryService {
    history: SharedHistory,
    writer: ClipboardWriter,
    events: broadcast::Sender<HistoryEvent>,
    feedback: FeedbackConfig,
}

impl ClipboardHistoryService {
    pub fn new(
        history: SharedHistory,
        writer: ClipboardWriter,
        events: broadcast::Sender<HistoryEvent>,
        feedback: FeedbackConfig,
    ) -> Self {
        Self {
            history,
            writer,
            events,
            feedback,
        }
    }

    pub fn items(&self) -> Vec<ClipboardItem> {
        self.history.items()
    }

    pub fn views(&self) -> Vec<ItemView> {
        self.history.views()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Writes the item back to the clipboard and publishes the feedback.
    ///
    /// History is never modified here; the watcher sees the written value on
    /// its next tick.
    pub fn activate(&self, id: &str) -> Result<ActivationFeedback, ClipboardError> {
        let item = self
            .history
            .get(id)
            .ok_or_else(|| ClipboardError::ItemNotFound(id.to_string()))?;
        self.activate_item(&item)
    }

    pub fn activate_index(&self, index: usize) -> Result<ActivationFeedback, ClipboardError> {
        let item = self
            .history
            .get_index(index)
            .ok_or_else(|| ClipboardError::ItemNotFound(format!("#{}", index)))?;
        self.activate_item(&item)
    }

    fn activate_item(&self, item: &ClipboardItem) -> Result<ActivationFeedback, ClipboardError> {
        let result = self.writer.write(item);

        let feedback = ActivationFeedback {
            item_id: item.id.clone(),
            outcome: match &result {
                Ok(()) => ActivationOutcome::Succeeded,
                Err(e) => ActivationOutcome::Failed(e.to_string()),
            },
            shown_at: Utc::now(),
            dismiss_after: self.feedback.dismiss_after(),
        };

        if let Err(e) = self
            .events
            .send(HistoryEvent::ActivationFinished(feedback.clone()))
        {
            debug!("No subscribers for activation feedback: {}", e);
        }

        result.map(|()| feedback)
    }

    pub fn clear(&self) {
        let count = self.history.len();
        self.history.clear();
        info!("Clipboard history cleared ({} items)", count);

        if let Err(e) = self.events.send(HistoryEvent::HistoryCleared) {
            debug!("No subscribers for history clear: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::backend::{shared, MemoryClipboard};
    use crate::clipboard::types::{ClipboardContent, ImageData, Representation};
    use crate::clipboard::watcher::{ClipboardWatcher, TickOutcome, WatcherConfig};

    struct Fixture {
        clipboard: MemoryClipboard,
        watcher: ClipboardWatcher,
        service: ClipboardHistoryService,
    }

    fn fixture() -> Fixture {
        let clipboard = MemoryClipboard::new();
        let backend = shared(clipboard.clone());
        let history = SharedHistory::default();
        let watcher = ClipboardWatcher::new(backend.clone(), history.clone(), WatcherConfig::default());
        let service = ClipboardHistoryService::new(
            history,
            ClipboardWriter::new(backend),
            watcher.event_sender(),
            FeedbackConfig::default(),
        );
        Fixture {
            clipboard,
            watcher,
            service,
        }
    }

    fn copy(f: &Fixture, text: &str) {
        f.clipboard.put_text(text);
        f.watcher.tick();
    }

    #[test]
    fn test_activate_most_recent_is_not_reinserted() {
        let f = fixture();
        copy(&f, "a");
        copy(&f, "b");

        f.clipboard.put_text("something else entirely");
        // Not ticked: clipboard changed behind the watcher's back, then we write "b" back.
        let top = f.service.items()[0].id.clone();
        f.service.activate(&top).unwrap();

        assert_eq!(f.clipboard.current().text(), Some("b"));
        assert_eq!(f.watcher.tick(), TickOutcome::Unchanged);
        assert_eq!(f.service.items().len(), 2);
    }

    #[test]
    fn test_activate_older_item_round_trips() {
        let f = fixture();
        copy(&f, "a");
        copy(&f, "b");

        let feedback = f.service.activate_index(1).unwrap();
        assert!(feedback.is_success());
        assert_eq!(f.clipboard.current().text(), Some("a"));

        // Most-recent dedup: "a" is new relative to "b".
        assert!(matches!(f.watcher.tick(), TickOutcome::Recorded(_)));
        assert_eq!(f.service.items().len(), 3);
    }

    #[test]
    fn test_activate_image_and_file() {
        let f = fixture();
        let image = ImageData::new(1, 1, vec![1, 2, 3, 4]);
        f.clipboard.put(Representation::Bitmap(image.clone()).into());
        f.watcher.tick();
        f.clipboard
            .put(Representation::FileList(vec!["/tmp/report.pdf".to_string()]).into());
        f.watcher.tick();
        copy(&f, "text");

        f.service.activate_index(2).unwrap();
        assert_eq!(f.clipboard.current().bitmap(), Some(&image));
        assert_eq!(f.clipboard.current().text(), None);

        f.service.activate_index(1).unwrap();
        assert_eq!(
            f.clipboard.current().file_list(),
            Some(&["/tmp/report.pdf".to_string()][..])
        );
        assert_eq!(f.service.views()[1].label, "File: report.pdf");
        assert!(matches!(f.service.items()[2].content, ClipboardContent::Image(_)));
    }

    #[test]
    fn test_unknown_item_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.service.activate("missing"),
            Err(ClipboardError::ItemNotFound("missing".to_string()))
        );
        assert!(matches!(
            f.service.activate_index(0),
            Err(ClipboardError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_failed_write_is_reported_and_published() {
        let f = fixture();
        copy(&f, "a");
        let mut events = f.service.subscribe();

        f.clipboard.set_unavailable(true);
        let result = f.service.activate_index(0);
        assert!(matches!(result, Err(ClipboardError::ClipboardUnavailable(_))));

        match events.try_recv() {
            Ok(HistoryEvent::ActivationFinished(feedback)) => {
                assert!(matches!(feedback.outcome, ActivationOutcome::Failed(_)));
            }
            other => panic!("expected ActivationFinished, got {:?}", other),
        }
        assert_eq!(f.service.items().len(), 1);
    }

    #[test]
    fn test_feedback_dismisses_after_timeout() {
        let shown_at = Utc::now();
        let feedback = ActivationFeedback {
            item_id: "x".to_string(),
            outcome: ActivationOutcome::Succeeded,
            shown_at,
            dismiss_after: FeedbackConfig::default().dismiss_after(),
        };

        assert!(feedback.is_visible(shown_at));
        assert!(feedback.is_visible(shown_at + chrono::Duration::milliseconds(1999)));
        assert!(!feedback.is_visible(shown_at + chrono::Duration::seconds(2)));
        assert!(!feedback.is_visible(shown_at + chrono::Duration::seconds(10)));
    }

    #[test]
    fn test_clear_empties_history_and_notifies() {
        let f = fixture();
        copy(&f, "a");
        let mut events = f.service.subscribe();

        f.service.clear();

        assert!(f.service.items().is_empty());
        assert!(matches!(events.try_recv(), Ok(HistoryEvent::HistoryCleared)));
    }
}
