// src/clipboard/watcher.rs
use super::backend::SharedBackend;
use super::classifier::ContentClassifier;
use super::types::{ClipboardError, ClipboardItem};
use crate::history::activation::ActivationFeedback;
use crate::history::store::{RecordOutcome, SharedHistory};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Read failures in a row are logged at `warn` on the first and every this many.
const FAILURE_WARN_EVERY: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Change notifications for presentation layers.
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    ItemRecorded(ClipboardItem),
    HistoryCleared,
    ActivationFinished(ActivationFeedback),
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Recorded(ClipboardItem),
    /// Clipboard still holds the most recent entry.
    Unchanged,
    /// Rejected by the history's dedup policy.
    Duplicate,
    /// Nothing classifiable on the clipboard.
    Empty,
    ReadFailed(ClipboardError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Running,
}

#[derive(Debug)]
enum WatcherCommand {
    Stop,
}

// Everything one tick needs; cloned into each blocking task.
#[derive(Clone)]
struct TickContext {
    backend: SharedBackend,
    history: SharedHistory,
    classifier: ContentClassifier,
    events: broadcast::Sender<HistoryEvent>,
    failures: Arc<AtomicU32>,
}

impl TickContext {
    fn run(&self) -> TickOutcome {
        let snapshot = {
            let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
            backend.snapshot()
        };

        let snapshot = match snapshot {
            Ok(snapshot) => {
                let failed = self.failures.swap(0, Ordering::SeqCst);
                if failed > 0 {
                    info!("Clipboard readable again after {} failed reads", failed);
                }
                snapshot
            }
            Err(e) => {
                let failed = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failed == 1 || failed % FAILURE_WARN_EVERY == 0 {
                    warn!("Clipboard read failed ({} in a row): {}", failed, e);
                } else {
                    debug!("Clipboard read failed ({} in a row): {}", failed, e);
                }
                return TickOutcome::ReadFailed(e);
            }
        };

        let Some(content) = self.classifier.classify(&snapshot) else {
            debug!("Tick: nothing classifiable on the clipboard");
            return TickOutcome::Empty;
        };

        match self.history.record(content) {
            RecordOutcome::Recorded(item) => {
                info!(
                    "Recorded {:?} item: {}",
                    item.content.kind(),
                    item.content.summary()
                );
                if let Err(e) = self.events.send(HistoryEvent::ItemRecorded(item.clone())) {
                    debug!("No subscribers for recorded item: {}", e);
                }
                TickOutcome::Recorded(item)
            }
            RecordOutcome::Unchanged => {
                debug!("Tick: clipboard unchanged");
                TickOutcome::Unchanged
            }
            RecordOutcome::Duplicate => {
                debug!("Tick: value already in history, not recorded");
                TickOutcome::Duplicate
            }
        }
    }
}

/// Polls a clipboard backend and records each distinct value in the history.
///
/// `Idle` until [`start`](Self::start), `Running` until [`stop`](Self::stop).
/// Ticks can also be driven by hand with [`tick`](Self::tick).
pub struct ClipboardWatcher {
    context: TickContext,
    config: WatcherConfig,

    control_sender: Option<mpsc::UnboundedSender<WatcherCommand>>,
    task: Option<JoinHandle<()>>,
    state: WatcherState,
}

impl ClipboardWatcher {
    pub fn new(backend: SharedBackend, history: SharedHistory, config: WatcherConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            context: TickContext {
                backend,
                history,
                classifier: ContentClassifier::new(),
                events,
                failures: Arc::new(AtomicU32::new(0)),
            },
            config,
            control_sender: None,
            task: None,
            state: WatcherState::Idle,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WatcherState::Running
    }

    pub fn backend(&self) -> SharedBackend {
        Arc::clone(&self.context.backend)
    }

    /// Sender half of the event channel, for other producers of [`HistoryEvent`]s.
    pub fn event_sender(&self) -> broadcast::Sender<HistoryEvent> {
        self.context.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.context.events.subscribe()
    }

    /// Runs one read, classify, record step on the calling thread.
    pub fn tick(&self) -> TickOutcome {
        self.context.run()
    }

    /// Starts periodic ticking. Must be called inside a Tokio runtime.
    ///
    /// The first tick runs immediately. Calling this while running only
    /// returns another subscription.
    pub fn start(&mut self) -> broadcast::Receiver<HistoryEvent> {
        let receiver = self.subscribe();
        if self.is_running() {
            debug!("Clipboard watcher already running");
            return receiver;
        }

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let period = self.config.poll_interval();
        self.task = Some(tokio::spawn(run_loop(
            self.context.clone(),
            period,
            control_rx,
        )));
        self.control_sender = Some(control_tx);
        self.state = WatcherState::Running;

        info!("Clipboard watcher started (every {:?})", period);
        receiver
    }

    /// Asks the loop to stop without waiting for it. No tick starts after the
    /// loop sees the request; one already in flight still completes.
    pub fn request_stop(&mut self) {
        if !self.is_running() {
            debug!("Clipboard watcher is not running");
            return;
        }

        if let Some(control_sender) = self.control_sender.take() {
            if control_sender.send(WatcherCommand::Stop).is_err() {
                debug!("Watcher loop already gone");
            }
        }
        self.state = WatcherState::Idle;
    }

    /// Stops ticking and waits for the loop to exit, so no tick is in flight
    /// on return.
    pub async fn stop(&mut self) {
        self.request_stop();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Clipboard watcher task failed: {}", e);
            }
            info!("Clipboard watcher stopped");
        }
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.request_stop();
    }
}

async fn run_loop(
    context: TickContext,
    period: Duration,
    mut control_rx: mpsc::UnboundedReceiver<WatcherCommand>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            command = control_rx.recv() => match command {
                Some(WatcherCommand::Stop) | None => break,
            },

            _ = ticker.tick() => {
                // Awaited before the next tick is polled, so ticks never overlap.
                let tick = context.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || tick.run()).await {
                    error!("Clipboard tick panicked: {}", e);
                }
            }
        }
    }

    debug!("Clipboard watcher loop exited");
}
