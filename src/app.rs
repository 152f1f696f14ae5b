//! Application state and main loop.
//!
//! `App` plays the filter-application side of the history store: it owns the
//! active filters, feeds the store on every change, and re-parses whatever
//! the store hands back on re-apply. Commands arrive as text lines.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};
use tracing::{debug, info, warn};

use crate::config::HistoryConfig;
use crate::event::{init_app_eventsource, init_input_events, AppEvent};
use crate::filter::AppliedFilter;
use crate::history::{FileStorage, HistoryStore, Storage};
use crate::saved::SavedFilters;
use crate::view::{self, Viewport};

const HELP: &str = "\
commands:
  apply <filter>...   replace the active filters
  add <filter>        apply one more filter
  remove <filter>     drop an active filter
  filters             show the active filters
  history             show the last used filter sets
  reapply <n>         re-apply history entry n
  clear               clear the history
  save                save the active filters as the startup default
  reset               forget the saved default filters
  flush               write pending history now
  quit                exit";

pub struct App {
    filters: Vec<AppliedFilter>,
    history: HistoryStore,
    saved: SavedFilters,
    viewport: Viewport,
    exit: bool,

    // events sources
    input_events: Receiver<String>,
    app_events: UnboundedReceiver<AppEvent>,
}

impl App {
    /// Build the app on file storage, reading commands from stdin.
    pub fn new(config: &HistoryConfig) -> Result<Self> {
        let storage = FileStorage::new(&config.storage_dir);
        info!("filter history stored in {}", storage.dir().display());
        Self::with_storage(config, Arc::new(storage), init_input_events())
    }

    /// Build the app on `storage`. Saved default filters, if any, become the
    /// active filters.
    pub fn with_storage(
        config: &HistoryConfig,
        storage: Arc<dyn Storage>,
        input_events: Receiver<String>,
    ) -> Result<Self> {
        let (event_sink, app_events) = init_app_eventsource();
        let saved = SavedFilters::open(Arc::clone(&storage), config.saved_key.clone());
        let filters: Vec<AppliedFilter> = saved
            .defaults()
            .unwrap_or_default()
            .iter()
            .map(|raw| AppliedFilter::parse(raw))
            .collect();

        let mut app = Self {
            filters,
            history: HistoryStore::open(storage, config, event_sink),
            saved,
            viewport: config.viewport,
            exit: false,
            input_events,
            app_events,
        };
        if !app.filters.is_empty() {
            info!(filters = app.filters.len(), "starting with saved filters");
            app.on_filters_changed()?;
        }
        Ok(app)
    }

    pub fn filters(&self) -> &[AppliedFilter] {
        &self.filters
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{HELP}");
        loop {
            if self.exit {
                break;
            }
            tokio::select! {
                line = self.input_events.recv() => {
                    let Some(line) = line else {
                        debug!("input stream ended");
                        break;
                    };
                    for out in self.handle_input(&line).await? {
                        println!("{out}");
                    }
                }
                res = self.app_events.recv() => {
                    let app_evt = res.with_context(|| anyhow::anyhow!("App event stream is ended"))?;
                    for out in self.handle_app_event(app_evt)? {
                        println!("{out}");
                    }
                }
            }
        }
        self.history.close().await;
        Ok(())
    }

    /// Handle one command line, returning lines to show.
    pub async fn handle_input(&mut self, line: &str) -> Result<Vec<String>> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Vec::new());
        };
        let args: Vec<&str> = words.collect();

        match command {
            "apply" => {
                self.filters = args.iter().map(|raw| AppliedFilter::parse(raw)).collect();
                self.on_filters_changed()?;
                Ok(self.describe_filters())
            }
            "add" => {
                for raw in args {
                    if !self.filters.iter().any(|f| f.raw == raw) {
                        self.filters.push(AppliedFilter::parse(raw));
                    }
                }
                self.on_filters_changed()?;
                Ok(self.describe_filters())
            }
            "remove" => {
                self.filters.retain(|f| !args.contains(&f.raw.as_str()));
                self.on_filters_changed()?;
                Ok(self.describe_filters())
            }
            "filters" => Ok(self.describe_filters()),
            "history" => Ok(view::render_menu(self.history.entries(), self.viewport)),
            "reapply" => self.reapply(args.first().copied()),
            "clear" => {
                self.history.clear()?;
                Ok(vec!["history cleared".to_string()])
            }
            "save" => {
                let raw = self.filters.iter().map(|f| f.raw.clone()).collect();
                self.saved.save(raw)?;
                Ok(vec!["filters saved".to_string()])
            }
            "reset" => {
                self.saved.reset()?;
                Ok(vec!["saved filters reset".to_string()])
            }
            "flush" => {
                self.history.flush().await;
                Ok(vec!["history written".to_string()])
            }
            "quit" | "exit" => {
                self.exit = true;
                Ok(Vec::new())
            }
            "help" => Ok(vec![HELP.to_string()]),
            other => Ok(vec![format!("unknown command: {other} (try `help`)")]),
        }
    }

    pub fn handle_app_event(&mut self, event: AppEvent) -> Result<Vec<String>> {
        match event {
            AppEvent::ApplyFilters { raw } => {
                self.filters = raw.iter().map(|r| AppliedFilter::parse(r)).collect();
                self.on_filters_changed()?;
                Ok(self.describe_filters())
            }
        }
    }

    /// Pick a visible history entry, 1-based.
    fn reapply(&mut self, arg: Option<&str>) -> Result<Vec<String>> {
        let shown = view::visible(self.history.entries(), self.viewport).len();
        let index = match arg.map(str::parse::<usize>) {
            Some(Ok(n)) if (1..=shown).contains(&n) => n - 1,
            _ => {
                warn!(?arg, shown, "rejected history index");
                return Ok(vec![format!("usage: reapply <1..={shown}>")]);
            }
        };
        self.history.reapply(index)?;
        Ok(Vec::new())
    }

    /// The active filters changed: let history see the new set.
    fn on_filters_changed(&mut self) -> Result<()> {
        if self.history.record_applied(&self.filters)? {
            debug!(entries = self.history.len(), "history updated");
        }
        Ok(())
    }

    fn describe_filters(&self) -> Vec<String> {
        if self.filters.is_empty() {
            return vec!["no active filters".to_string()];
        }
        let labels: Vec<String> = self
            .filters
            .iter()
            .map(|f| {
                if f.is_valid {
                    f.to_descriptor().to_string()
                } else {
                    format!("{} (invalid)", f.raw)
                }
            })
            .collect();
        vec![format!("active: {}", labels.join("  "))]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::history::MemoryStorage;
    use tokio::sync::mpsc;

    fn test_app(storage: &MemoryStorage, viewport: Viewport) -> App {
        let config = HistoryConfig {
            viewport,
            ..HistoryConfig::default()
        };
        let (_tx, rx) = mpsc::channel(1);
        App::with_storage(&config, Arc::new(storage.clone()), rx).unwrap()
    }

    fn history_raws(app: &App) -> Vec<Vec<String>> {
        app.history()
            .entries()
            .iter()
            .map(|set| set.iter().map(|f| f.raw.clone()).collect())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_records_history() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply a=1 b=2").await.unwrap();
        app.handle_input("apply c=3").await.unwrap();

        assert_eq!(history_raws(&app), vec![vec!["c=3"], vec!["a=1", "b=2"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_filters_not_recorded() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply job= =x").await.unwrap();

        assert_eq!(app.filters().len(), 2);
        assert!(app.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_and_remove() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("add a=1").await.unwrap();
        app.handle_input("add b=2").await.unwrap();
        app.handle_input("remove a=1").await.unwrap();

        assert_eq!(
            history_raws(&app),
            vec![vec!["b=2"], vec!["a=1", "b=2"], vec!["a=1"]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reapply_round_trip() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply a=1").await.unwrap();
        app.handle_input("apply b=2").await.unwrap();
        app.handle_input("reapply 2").await.unwrap();

        let event = app.app_events.try_recv().unwrap();
        assert_eq!(
            event,
            AppEvent::ApplyFilters {
                raw: vec!["a=1".to_string()]
            }
        );
        app.handle_app_event(event).unwrap();

        assert_eq!(app.filters()[0].raw, "a=1");
        assert_eq!(history_raws(&app), vec![vec!["a=1"], vec!["b=2"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reapply_index_bounded_by_viewport() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Mobile);

        for i in 0..6 {
            app.handle_input(&format!("apply a={i}")).await.unwrap();
        }
        assert_eq!(app.history().len(), 6);

        let out = app.handle_input("reapply 5").await.unwrap();
        assert_eq!(out, vec!["usage: reapply <1..=4>"]);
        assert!(app.app_events.try_recv().is_err());

        let out = app.handle_input("reapply 0").await.unwrap();
        assert_eq!(out.len(), 1);
        let out = app.handle_input("reapply x").await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_and_flush() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply a=1").await.unwrap();
        app.handle_input("clear").await.unwrap();
        app.handle_input("flush").await.unwrap();

        assert!(app.history().is_empty());
        assert_eq!(storage.get("filters").as_deref(), Some(r#"{"filters":[]}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_and_unknown() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        let out = app.handle_input("frobnicate").await.unwrap();
        assert!(out[0].starts_with("unknown command"));
        assert!(app.handle_input("").await.unwrap().is_empty());

        app.handle_input("quit").await.unwrap();
        assert!(app.should_exit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_becomes_startup_filters() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply a=1 cpu").await.unwrap();
        let out = app.handle_input("save").await.unwrap();
        assert_eq!(out, vec!["filters saved"]);
        app.history.flush().await;
        assert_eq!(
            storage.get("savedFilters").as_deref(),
            Some(r#"{"present":true,"filters":["a=1","cpu"]}"#)
        );

        let restarted = test_app(&storage, Viewport::Desktop);
        let raws: Vec<&str> = restarted.filters().iter().map(|f| f.raw.as_str()).collect();
        assert_eq!(raws, vec!["a=1", "cpu"]);
        assert_eq!(history_raws(&restarted)[0], vec!["a=1", "cpu"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_startup_filters() {
        let storage = MemoryStorage::new();
        let mut app = test_app(&storage, Viewport::Desktop);

        app.handle_input("apply a=1").await.unwrap();
        app.handle_input("save").await.unwrap();
        let out = app.handle_input("reset").await.unwrap();
        assert_eq!(out, vec!["saved filters reset"]);

        // Reset only forgets the default; the active filters and history stay.
        assert_eq!(app.filters().len(), 1);
        assert_eq!(app.history().len(), 1);

        let restarted = test_app(&storage, Viewport::Desktop);
        assert!(restarted.filters().is_empty());
    }
}
