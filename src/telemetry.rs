// src/telemetry.rs
//! Process memory readout for status displays. Nothing in the clipboard core
//! waits on it.

use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub refresh_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
        }
    }
}

impl TelemetryConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

/// `"12.3 MB"`, binary units.
pub fn format_memory_usage(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / BYTES_PER_MB)
}

/// Whether [`current_memory_footprint`] can return a value in this build.
pub const fn memory_readout_supported() -> bool {
    cfg!(feature = "sysinfo")
}

/// Resident memory of this process in bytes.
#[cfg(feature = "sysinfo")]
pub fn current_memory_footprint() -> Option<u64> {
    use sysinfo::{ProcessExt, System, SystemExt};

    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(e) => {
            debug!("Cannot determine own pid: {}", e);
            return None;
        }
    };

    let mut system = System::new();
    if !system.refresh_process(pid) {
        debug!("Process {} not visible to sysinfo", pid);
        return None;
    }
    system.process(pid).map(|process| process.memory())
}

#[cfg(not(feature = "sysinfo"))]
pub fn current_memory_footprint() -> Option<u64> {
    None
}

/// Periodically publishes the formatted memory footprint.
pub struct MemoryReporter {
    receiver: watch::Receiver<Option<String>>,
    task: JoinHandle<()>,
}

impl MemoryReporter {
    /// Must be called inside a Tokio runtime. The first reading is taken
    /// immediately.
    pub fn spawn(period: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let reading = tokio::task::spawn_blocking(current_memory_footprint)
                    .await
                    .ok()
                    .flatten()
                    .map(format_memory_usage);

                if sender.send(reading).is_err() {
                    break;
                }
            }
            debug!("Memory reporter stopped");
        });

        Self { receiver, task }
    }

    /// Latest formatted value; `None` until a reading succeeds.
    pub fn latest(&self) -> Option<String> {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.receiver.clone()
    }

    pub fn status_line(&self) -> String {
        memory_status_line(self.latest().as_deref())
    }
}

fn memory_status_line(latest: Option<&str>) -> String {
    match latest {
        Some(usage) => format!("memory: {}", usage),
        None if !memory_readout_supported() => {
            "memory: unavailable (built without the `sysinfo` feature)".to_string()
        }
        None => "memory: unavailable".to_string(),
    }
}

impl Drop for MemoryReporter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
