//! Event handling between the history store and the rest of the application.
//!
//! Two sources feed the main loop:
//!
//! - **Input events**: lines typed by the operator, read on a dedicated task
//!   so the loop never blocks on stdin
//! - **App events**: requests between components, e.g. the history store
//!   asking the filter-application side to re-apply a stored filter set
//!
//! The store never parses filters itself; re-applying only hands raw filter
//! texts back through this channel.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

/// Application-wide events for inter-component communication.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Replace the active filters with these raw texts, re-parsing each.
    ApplyFilters { raw: Vec<String> },
}

/// Creates the application event channel.
///
/// Unbounded is fine: app events are low-frequency and tiny, and senders
/// (the store) must not block.
pub fn init_app_eventsource() -> (UnboundedSender<AppEvent>, UnboundedReceiver<AppEvent>) {
    mpsc::unbounded_channel()
}

/// Spawns a task forwarding stdin lines.
///
/// The channel closes on EOF or on a read error.
pub fn init_input_events() -> Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
