//! Saved default filters.
//!
//! The operator can save the active filters as the set to start with next
//! time, or reset back to none. Stored under its own key in the same
//! storage as the history, written immediately (saves are rare).

use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::history::Storage;

/// Document persisted under the saved filters key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSavedFilters {
    pub present: bool,
    pub filters: Vec<String>,
}

pub struct SavedFilters {
    storage: Arc<dyn Storage>,
    key: String,
    saved: PersistedSavedFilters,
}

impl SavedFilters {
    /// Load saved filters. Missing or malformed data means nothing is saved.
    pub fn open(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let saved = match storage.read(&key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed saved filters: {}", e);
                PersistedSavedFilters::default()
            }),
            Ok(None) => PersistedSavedFilters::default(),
            Err(e) => {
                warn!("Failed to read saved filters: {:#}", e);
                PersistedSavedFilters::default()
            }
        };
        Self { storage, key, saved }
    }

    /// Raw filters to start with, if any were saved.
    pub fn defaults(&self) -> Option<&[String]> {
        self.saved.present.then_some(self.saved.filters.as_slice())
    }

    pub fn save(&mut self, raw: Vec<String>) -> anyhow::Result<()> {
        info!(filters = raw.len(), "saving default filters");
        self.saved = PersistedSavedFilters {
            present: true,
            filters: raw,
        };
        self.persist()
    }

    /// Forget the saved filters.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        info!("resetting default filters");
        self.saved = PersistedSavedFilters::default();
        self.persist()
    }

    fn persist(&self) -> anyhow::Result<()> {
        let doc = serde_json::to_string(&self.saved).context("Failed to serialize saved filters")?;
        self.storage.write(&self.key, &doc)
    }
}
