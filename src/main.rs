//! Main entry point for filter-history.
//!
//! Initializes logging and configuration, then runs the interactive loop
//! until `quit` or end of input. Pending history writes are flushed on exit.

use anyhow::Result;
use filter_history::utils::logger;
use filter_history::{App, HistoryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging before anything else
    let _log_guard = match logger::init_logging(&logger::default_log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    let config = HistoryConfig::from_env();
    tracing::info!(?config, "starting");

    App::new(&config)?.run().await
}
