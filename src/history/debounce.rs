//! Debounced writes to storage.
//!
//! A background task holds at most one pending value. Every new value
//! replaces the pending one and restarts the delay; once the delay passes
//! without another value, the latest one is written. Rapid updates therefore
//! cost a single write.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, warn};

use super::storage::Storage;

enum WriterCommand {
    Write(String),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Must be created inside a tokio runtime.
///
/// Dropping the handle closes the channel; the task writes whatever is still
/// pending and exits.
pub struct DebouncedWriter {
    tx: UnboundedSender<WriterCommand>,
    task: JoinHandle<()>,
}

impl DebouncedWriter {
    pub fn spawn(storage: Arc<dyn Storage>, key: impl Into<String>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(storage, key.into(), delay, rx));
        Self { tx, task }
    }

    /// Replace the pending value and restart the delay.
    pub fn schedule(&self, value: String) {
        if self.tx.send(WriterCommand::Write(value)).is_err() {
            warn!("debounced writer task is gone, dropping write");
        }
    }

    /// Write the pending value now, if any, and wait until it is done.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush(ack_tx)).is_err() {
            warn!("debounced writer task is gone, nothing to flush");
            return;
        }
        if ack_rx.await.is_err() {
            warn!("debounced writer exited before acknowledging flush");
        }
    }

    /// Close the channel and wait for the final write.
    pub async fn shutdown(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            error!("debounced writer task failed: {}", e);
        }
    }
}

async fn run_writer(
    storage: Arc<dyn Storage>,
    key: String,
    delay: Duration,
    mut rx: UnboundedReceiver<WriterCommand>,
) {
    let mut pending: Option<String> = None;
    let sleep = time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(WriterCommand::Write(value)) => {
                    pending = Some(value);
                    sleep.as_mut().reset(Instant::now() + delay);
                }
                Some(WriterCommand::Flush(ack)) => {
                    if let Some(value) = pending.take() {
                        write_value(storage.as_ref(), &key, &value);
                    }
                    if ack.send(()).is_err() {
                        debug!("flush requester went away");
                    }
                }
                None => {
                    if let Some(value) = pending.take() {
                        write_value(storage.as_ref(), &key, &value);
                    }
                    break;
                }
            },
            () = &mut sleep, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    write_value(storage.as_ref(), &key, &value);
                }
            }
        }
    }
}

fn write_value(storage: &dyn Storage, key: &str, value: &str) {
    match storage.write(key, value) {
        Ok(()) => debug!(key, bytes = value.len(), "persisted"),
        Err(e) => error!("Failed to persist {}: {:#}", key, e),
    }
}
