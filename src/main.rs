// src/main.rs
use clipkeep::clipboard::system::SystemClipboard;
use clipkeep::clipboard::watcher::HistoryEvent;
use clipkeep::config::AppConfig;
use clipkeep::history::activation::{ActivationOutcome, ClipboardHistoryService};
use clipkeep::telemetry::MemoryReporter;
use clipkeep::ClipKeep;

use anyhow::{Context, Result};
use log::{info, warn};
use std::io::BufRead;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

const HELP: &str = "commands: list | json | copy <index> | clear | mem | quit";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("clipkeep starting...");

    let config = AppConfig::load();
    let clipboard = SystemClipboard::new().context("Failed to open the system clipboard")?;
    let mut app = ClipKeep::new(clipboard, &config);
    let memory = MemoryReporter::spawn(config.telemetry.refresh_interval());

    let mut events = app.watcher.start();
    let mut lines = spawn_stdin_reader();
    println!("{}", HELP);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }

            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} history events", skipped),
                Err(RecvError::Closed) => break,
            },

            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                if !run_command(line.trim(), &app.service, &memory)? {
                    break;
                }
            }
        }
    }

    app.watcher.stop().await;
    info!("clipkeep stopped");
    Ok(())
}

// A plain thread, so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

// Returns false on `quit`.
fn run_command(line: &str, service: &ClipboardHistoryService, memory: &MemoryReporter) -> Result<bool> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("list") => {
            let views = service.views();
            if views.is_empty() {
                println!("(history is empty)");
            }
            for (index, view) in views.iter().enumerate() {
                println!(
                    "{:>3}  {}  {}",
                    index,
                    view.captured_at.format("%H:%M:%S"),
                    view.label.replace('\n', " ")
                );
            }
        }
        Some("json") => {
            println!("{}", serde_json::to_string_pretty(&service.views())?);
        }
        Some("copy") => match parts.next().map(str::parse::<usize>) {
            Some(Ok(index)) => {
                if let Err(e) = service.activate_index(index) {
                    warn!("Activation failed: {}", e);
                }
            }
            _ => println!("usage: copy <index>"),
        },
        Some("clear") => service.clear(),
        Some("mem") => println!("{}", memory.status_line()),
        Some("quit") | Some("exit") => return Ok(false),
        Some(other) => println!("unknown command '{}'; {}", other, HELP),
    }
    Ok(true)
}

fn print_event(event: &HistoryEvent) {
    match event {
        HistoryEvent::ItemRecorded(item) => {
            println!("+ {}", item.view().label.replace('\n', " "));
        }
        HistoryEvent::HistoryCleared => println!("history cleared"),
        HistoryEvent::ActivationFinished(feedback) => match &feedback.outcome {
            ActivationOutcome::Succeeded => println!("copied to clipboard"),
            ActivationOutcome::Failed(message) => println!("copy failed: {}", message),
        },
    }
}
