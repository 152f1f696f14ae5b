//! filter-history - remembers the last filter sets applied to an alert list.
//!
//! The core is [`history::HistoryStore`]: a most-recently-used list of at
//! most eight filter sets, deduplicated by content, persisted through a
//! debounced writer. Around it:
//! - `filter`: filter descriptors, filter sets and the producer-side parsing
//! - `saved`: the saved default filters applied at startup
//! - `view`: how many entries the history menu shows per viewport
//! - `event`: channels between the store and the filter-application side
//! - `app`: an interactive host driving the store from text commands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use filter_history::config::HistoryConfig;
//! use filter_history::event::init_app_eventsource;
//! use filter_history::filter::AppliedFilter;
//! use filter_history::history::{HistoryStore, MemoryStorage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (app_event_tx, _app_event_rx) = init_app_eventsource();
//!     let config = HistoryConfig::default();
//!     let mut store = HistoryStore::open(Arc::new(MemoryStorage::new()), &config, app_event_tx);
//!
//!     let applied = vec![AppliedFilter::parse("@state=active"), AppliedFilter::parse("job=node")];
//!     store.record_applied(&applied)?;
//!     assert_eq!(store.len(), 1);
//!
//!     // Hands ["@state=active", "job=node"] back through the event channel.
//!     store.reapply(0)?;
//!     store.close().await;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod event;
pub mod filter;
pub mod history;
pub mod saved;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use app::App;
pub use config::HistoryConfig;
pub use event::{init_app_eventsource, AppEvent};
pub use filter::{AppliedFilter, FilterDescriptor, FilterSet};
pub use history::{HistoryLog, HistoryStore, Storage};
