// src/history/mod.rs
pub mod store;
pub mod activation;

pub use store::{DedupPolicy, HistoryConfig, HistoryStore, RecordOutcome, SharedHistory};
pub use activation::{ActivationFeedback, ActivationOutcome, ClipboardHistoryService, FeedbackConfig};
