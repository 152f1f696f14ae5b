//! Runtime configuration.
//!
//! Defaults match the browser behaviour (key `filters`, 8 entries, 100ms
//! debounce). A few environment variables override them:
//!
//! - `FILTER_HISTORY_DIR` - directory holding the history file
//! - `FILTER_HISTORY_DEBOUNCE_MS` - write coalescing delay in milliseconds
//! - `FILTER_HISTORY_VIEWPORT_WIDTH` - width used to pick desktop or mobile
//!   display limits

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::MAX_HISTORY_SIZE;
use crate::view::Viewport;

pub const DEFAULT_KEY: &str = "filters";
pub const DEFAULT_SAVED_KEY: &str = "savedFilters";
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub storage_dir: PathBuf,
    pub key: String,
    /// Key holding the saved default filters.
    pub saved_key: String,
    /// History length; anything above 8 is capped.
    pub capacity: usize,
    pub debounce_ms: u64,
    pub viewport: Viewport,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            key: DEFAULT_KEY.to_string(),
            saved_key: DEFAULT_SAVED_KEY.to_string(),
            capacity: MAX_HISTORY_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            viewport: Viewport::Desktop,
        }
    }
}

impl HistoryConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("FILTER_HISTORY_DIR").filter(|d| !d.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("FILTER_HISTORY_DEBOUNCE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.debounce_ms = ms,
                Err(e) => warn!("Ignoring FILTER_HISTORY_DEBOUNCE_MS={:?}: {}", raw, e),
            }
        }

        if let Some(raw) = lookup("FILTER_HISTORY_VIEWPORT_WIDTH") {
            match raw.trim().parse::<u32>() {
                Ok(width) => config.viewport = Viewport::from_width(width),
                Err(e) => warn!("Ignoring FILTER_HISTORY_VIEWPORT_WIDTH={:?}: {}", raw, e),
            }
        }

        config
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_storage_dir() -> PathBuf {
    // ~/.filter-history, falling back to the working directory.
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".filter-history")
}
