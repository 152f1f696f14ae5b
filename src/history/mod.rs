//! Filter history: the last few filter sets the user applied.
//!
//! `HistoryLog` is the bounded, deduplicated, most-recent-first list itself.
//! `HistoryStore` wraps it with loading from storage, debounced persistence
//! and re-applying an entry through the application event channel.

mod debounce;
mod storage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::HistoryConfig;
use crate::event::AppEvent;
use crate::filter::{canonical, raw_filters, reduce_applied, AppliedFilter, FilterSet};

pub use debounce::DebouncedWriter;
pub use storage::{FileStorage, MemoryStorage, Storage};

/// Maximum number of filter sets kept in history.
pub const MAX_HISTORY_SIZE: usize = 8;

/// Document persisted under the history key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub filters: Vec<FilterSet>,
}

/// Ordered filter sets, most recently used first.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    entries: Vec<FilterSet>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

impl HistoryLog {
    /// Capacity is capped at [`MAX_HISTORY_SIZE`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_HISTORY_SIZE);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from persisted entries.
    ///
    /// An empty set or a descriptor without a value makes the whole input
    /// corrupt. Duplicates are dropped and the result is capped.
    pub fn from_entries(entries: Vec<FilterSet>, capacity: usize) -> anyhow::Result<Self> {
        if let Some(idx) = entries
            .iter()
            .position(|set| set.is_empty() || set.iter().any(|f| f.value.is_empty()))
        {
            anyhow::bail!("history entry {idx} is empty or has a filter without a value");
        }

        let mut log = Self::new(capacity);
        let mut seen = Vec::with_capacity(log.capacity);
        for set in entries {
            if log.entries.len() >= log.capacity {
                break;
            }
            let json = canonical(&set)?;
            if seen.contains(&json) {
                continue;
            }
            seen.push(json);
            log.entries.push(set);
        }
        Ok(log)
    }

    /// Put `candidate` on top, dropping any entry with the same content and
    /// anything past capacity. Returns whether the log changed.
    ///
    /// Descriptors without a value are never stored; a candidate left empty
    /// after dropping them is ignored.
    pub fn insert(&mut self, candidate: FilterSet) -> anyhow::Result<bool> {
        let candidate: FilterSet = candidate
            .into_iter()
            .filter(|f| !f.value.is_empty())
            .collect();
        if candidate.is_empty() {
            return Ok(false);
        }
        let candidate_json = canonical(&candidate)?;
        let before = self.canonical()?;

        let mut updated = Vec::with_capacity(self.capacity);
        updated.push(candidate);
        for set in self.entries.drain(..) {
            if canonical(&set)? != candidate_json {
                updated.push(set);
            }
        }
        updated.truncate(self.capacity);
        self.entries = updated;

        Ok(self.canonical()? != before)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[FilterSet] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compact JSON of the whole log, for change detection.
    pub fn canonical(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    fn to_document(&self) -> anyhow::Result<String> {
        let doc = PersistedHistory {
            filters: self.entries.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }
}

/// The history log plus its persistence.
///
/// Reads are served from memory; storage is read once when the store opens
/// and written through a [`DebouncedWriter`]. Must be opened inside a tokio
/// runtime.
pub struct HistoryStore {
    log: HistoryLog,
    writer: DebouncedWriter,
    app_event_tx: UnboundedSender<AppEvent>,
}

impl HistoryStore {
    /// Open the store, loading any persisted history.
    pub fn open(
        storage: Arc<dyn Storage>,
        config: &HistoryConfig,
        app_event_tx: UnboundedSender<AppEvent>,
    ) -> Self {
        let log = load(storage.as_ref(), &config.key, config.capacity);
        info!(entries = log.len(), key = %config.key, "filter history loaded");

        let writer = DebouncedWriter::spawn(storage, config.key.clone(), config.debounce());
        Self {
            log,
            writer,
            app_event_tx,
        }
    }

    /// Record the filter set currently applied.
    ///
    /// Moves it to the front (or adds it), and schedules a write if the log
    /// changed. Returns whether it changed.
    pub fn record_filter_set(&mut self, candidate: FilterSet) -> anyhow::Result<bool> {
        if !self.log.insert(candidate)? {
            return Ok(false);
        }
        debug!(entries = self.log.len(), "filter history changed");
        self.persist()?;
        Ok(true)
    }

    /// Observation step: reduce the producer's filters, then record them.
    pub fn record_applied(&mut self, filters: &[AppliedFilter]) -> anyhow::Result<bool> {
        self.record_filter_set(reduce_applied(filters))
    }

    /// Send the raw texts of entry `index` back to the filter-application
    /// side, which re-parses and re-applies them.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. Callers bound it to the displayed
    /// list first.
    pub fn reapply(&self, index: usize) -> anyhow::Result<()> {
        let raw = raw_filters(&self.log.entries()[index]);
        debug!(index, filters = raw.len(), "re-applying filter set");
        self.app_event_tx.send(AppEvent::ApplyFilters { raw })?;
        Ok(())
    }

    /// Empty the history and persist the empty state.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.log.clear();
        info!("filter history cleared");
        self.persist()
    }

    pub fn entries(&self) -> &[FilterSet] {
        self.log.entries()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Write any pending change now.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Flush and stop the writer task.
    pub async fn close(self) {
        self.writer.shutdown().await;
    }

    fn persist(&self) -> anyhow::Result<()> {
        self.writer.schedule(self.log.to_document()?);
        Ok(())
    }
}

/// Read the persisted log. Missing or malformed data yields an empty log.
fn load(storage: &dyn Storage, key: &str, capacity: usize) -> HistoryLog {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HistoryLog::new(capacity),
        Err(e) => {
            warn!("Failed to read filter history, starting empty: {:#}", e);
            return HistoryLog::new(capacity);
        }
    };

    let doc = match serde_json::from_str::<PersistedHistory>(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Ignoring malformed filter history: {}", e);
            return HistoryLog::new(capacity);
        }
    };
    HistoryLog::from_entries(doc.filters, capacity).unwrap_or_else(|e| {
        warn!("Ignoring unreadable filter history: {:#}", e);
        HistoryLog::new(capacity)
    })
}
