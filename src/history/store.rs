// src/history/store.rs
use crate::clipboard::types::{ClipboardContent, ClipboardItem, ImageKeyPolicy, ItemView};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Which existing entries a new value is compared against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Only the newest entry. Copying A, B, A again yields three entries.
    #[default]
    MostRecent,
    /// Every entry. A key can appear at most once in the store.
    WholeHistory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    pub dedup: DedupPolicy,
    pub image_key: ImageKeyPolicy,
    /// Oldest entries are evicted beyond this many. `None` keeps everything.
    pub max_entries: Option<usize>,
}

/// Ordered clipboard history, newest first.
///
/// Entries are never reordered: re-inserting a known value is a no-op, not a
/// move to the front.
#[derive(Debug, Default)]
pub struct HistoryStore {
    items: VecDeque<ClipboardItem>,
    config: HistoryConfig,
}

impl HistoryStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            items: VecDeque::new(),
            config,
        }
    }

    pub fn key_for(&self, content: &ClipboardContent) -> String {
        content.comparison_key(self.config.image_key)
    }

    /// True if the dedup policy rejects a value with `key`. Under
    /// [`DedupPolicy::MostRecent`] only the newest entry is compared.
    pub fn rejects_key(&self, key: &str) -> bool {
        match self.config.dedup {
            DedupPolicy::MostRecent => self
                .items
                .front()
                .map_or(false, |item| item.comparison_key == key),
            DedupPolicy::WholeHistory => self.items.iter().any(|item| item.comparison_key == key),
        }
    }

    pub fn insert_if_new(&mut self, content: ClipboardContent) -> Option<ClipboardItem> {
        let key = self.key_for(&content);
        if self.rejects_key(&key) {
            return None;
        }

        let item = ClipboardItem::new(content, key);
        self.items.push_front(item.clone());

        if let Some(max) = self.config.max_entries {
            self.items.truncate(max.max(1));
        }

        Some(item)
    }

    pub fn items(&self) -> Vec<ClipboardItem> {
        self.items.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipboardItem> {
        self.items.iter()
    }

    pub fn most_recent(&self) -> Option<&ClipboardItem> {
        self.items.front()
    }

    pub fn get(&self, id: &str) -> Option<&ClipboardItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_index(&self, index: usize) -> Option<&ClipboardItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Result of offering one observed value to the history.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded(ClipboardItem),
    /// Same key as the newest entry.
    Unchanged,
    /// Rejected by the dedup policy against an older entry.
    Duplicate,
}

/// Cloneable handle to one [`HistoryStore`]; every operation is one critical
/// section, so a reader never sees a half-applied insertion.
#[derive(Clone, Default)]
pub struct SharedHistory {
    inner: Arc<Mutex<HistoryStore>>,
}

impl SharedHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self::new(HistoryStore::new(config))
    }

    // A panic while holding the lock cannot leave the deque half-written, so
    // the store stays usable after poisoning.
    fn lock(&self) -> MutexGuard<'_, HistoryStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compare against the newest entry, then insert under the dedup policy.
    pub fn record(&self, content: ClipboardContent) -> RecordOutcome {
        let mut store = self.lock();
        let key = store.key_for(&content);
        if store
            .most_recent()
            .map_or(false, |item| item.comparison_key == key)
        {
            return RecordOutcome::Unchanged;
        }

        match store.insert_if_new(content) {
            Some(item) => RecordOutcome::Recorded(item),
            None => RecordOutcome::Duplicate,
        }
    }

    pub fn insert_if_new(&self, content: ClipboardContent) -> Option<ClipboardItem> {
        self.lock().insert_if_new(content)
    }

    pub fn items(&self) -> Vec<ClipboardItem> {
        self.lock().items()
    }

    pub fn views(&self) -> Vec<ItemView> {
        self.lock().iter().map(ClipboardItem::view).collect()
    }

    pub fn most_recent(&self) -> Option<ClipboardItem> {
        self.lock().most_recent().cloned()
    }

    pub fn get(&self, id: &str) -> Option<ClipboardItem> {
        self.lock().get(id).cloned()
    }

    pub fn get_index(&self, index: usize) -> Option<ClipboardItem> {
        self.lock().get_index(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::types::{ImageData, IMAGE_PLACEHOLDER_KEY};
    use std::collections::HashSet;

    fn text(s: &str) -> ClipboardContent {
        ClipboardContent::Text(s.to_string())
    }

    fn keys(store: &HistoryStore) -> Vec<String> {
        store.iter().map(|item| item.comparison_key.clone()).collect()
    }

    #[test]
    fn test_insert_same_value_twice() {
        let mut store = HistoryStore::default();

        assert!(store.insert_if_new(text("a")).is_some());
        assert!(store.insert_if_new(text("a")).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_newest_first_ordering() {
        let mut store = HistoryStore::default();
        for s in ["A", "B", "C"] {
            store.insert_if_new(text(s));
        }

        assert_eq!(keys(&store), vec!["C", "B", "A"]);
        assert_eq!(store.most_recent().unwrap().content, text("C"));
    }

    #[test]
    fn test_most_recent_policy_allows_older_repeat() {
        let mut store = HistoryStore::default();
        store.insert_if_new(text("foo"));
        store.insert_if_new(text("bar"));

        assert!(store.insert_if_new(text("foo")).is_some());
        assert_eq!(keys(&store), vec!["foo", "bar", "foo"]);
    }

    #[test]
    fn test_whole_history_policy_rejects_any_known_key() {
        let mut store = HistoryStore::new(HistoryConfig {
            dedup: DedupPolicy::WholeHistory,
            ..Default::default()
        });
        store.insert_if_new(text("foo"));
        store.insert_if_new(text("bar"));

        assert!(store.insert_if_new(text("foo")).is_none());
        // No move-to-front either.
        assert_eq!(keys(&store), vec!["bar", "foo"]);
    }

    #[test]
    fn test_rejects_key_follows_policy() {
        let mut recent = HistoryStore::default();
        let mut whole = HistoryStore::new(HistoryConfig {
            dedup: DedupPolicy::WholeHistory,
            ..Default::default()
        });
        for store in [&mut recent, &mut whole] {
            store.insert_if_new(text("old"));
            store.insert_if_new(text("new"));
        }

        assert!(recent.rejects_key("new"));
        assert!(!recent.rejects_key("old"));
        assert!(whole.rejects_key("new"));
        assert!(whole.rejects_key("old"));
        assert!(!whole.rejects_key("unseen"));
    }

    #[test]
    fn test_max_entries_evicts_oldest() {
        let mut store = HistoryStore::new(HistoryConfig {
            max_entries: Some(2),
            ..Default::default()
        });
        for s in ["1", "2", "3"] {
            store.insert_if_new(text(s));
        }

        assert_eq!(keys(&store), vec!["3", "2"]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = HistoryStore::default();
        for i in 0..50 {
            store.insert_if_new(text(&i.to_string()));
        }

        let ids: HashSet<_> = store.iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids.len(), 50);
        let first_id = store.get_index(0).unwrap().id.clone();
        assert_eq!(store.get(&first_id).unwrap().content, text("49"));
    }

    #[test]
    fn test_placeholder_images_collapse_when_consecutive() {
        let mut store = HistoryStore::default();
        let red = ClipboardContent::Image(ImageData::new(1, 1, vec![255, 0, 0, 255]));
        let blue = ClipboardContent::Image(ImageData::new(1, 1, vec![0, 0, 255, 255]));

        assert!(store.insert_if_new(red).is_some());
        assert!(store.insert_if_new(blue).is_none());
        assert_eq!(store.most_recent().unwrap().comparison_key, IMAGE_PLACEHOLDER_KEY);
    }

    #[test]
    fn test_content_hash_images_stay_distinct() {
        let mut store = HistoryStore::new(HistoryConfig {
            image_key: ImageKeyPolicy::ContentHash,
            ..Default::default()
        });
        let red = ClipboardContent::Image(ImageData::new(1, 1, vec![255, 0, 0, 255]));
        let blue = ClipboardContent::Image(ImageData::new(1, 1, vec![0, 0, 255, 255]));

        assert!(store.insert_if_new(red.clone()).is_some());
        assert!(store.insert_if_new(blue).is_some());
        assert!(store.insert_if_new(text("x")).is_some());
        assert!(store.insert_if_new(red).is_some());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_record_outcomes() {
        let history = SharedHistory::with_config(HistoryConfig {
            dedup: DedupPolicy::WholeHistory,
            ..Default::default()
        });

        assert!(matches!(history.record(text("a")), RecordOutcome::Recorded(_)));
        assert_eq!(history.record(text("a")), RecordOutcome::Unchanged);
        assert!(matches!(history.record(text("b")), RecordOutcome::Recorded(_)));
        assert_eq!(history.record(text("a")), RecordOutcome::Duplicate);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_shared_history_clones_see_same_store() {
        let history = SharedHistory::default();
        let other = history.clone();

        history.insert_if_new(text("x"));
        assert_eq!(other.len(), 1);
        assert_eq!(other.views()[0].label, "x");

        other.clear();
        assert!(history.is_empty());
    }
}
