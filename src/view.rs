//! Display policy for the history menu.
//!
//! The menu shows only the front of the history, fewer entries on narrow
//! screens. This is a read-only view; it never touches the log.

use serde::{Deserialize, Serialize};

use crate::filter::FilterSet;

/// Widths below this are treated as mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Mobile,
}

impl Viewport {
    pub fn from_width(width: u32) -> Self {
        if width < MOBILE_BREAKPOINT {
            Viewport::Mobile
        } else {
            Viewport::Desktop
        }
    }

    /// How many history entries the menu shows.
    pub fn max_items(self) -> usize {
        match self {
            Viewport::Desktop => 8,
            Viewport::Mobile => 4,
        }
    }
}

/// Leading entries the menu displays for `viewport`.
pub fn visible(entries: &[FilterSet], viewport: Viewport) -> &[FilterSet] {
    &entries[..entries.len().min(viewport.max_items())]
}

/// One menu line per visible entry, numbered from 1.
pub fn render_menu(entries: &[FilterSet], viewport: Viewport) -> Vec<String> {
    let shown = visible(entries, viewport);
    if shown.is_empty() {
        return vec!["Last used filters: (empty)".to_string()];
    }

    let mut lines = Vec::with_capacity(shown.len() + 1);
    lines.push("Last used filters:".to_string());
    for (idx, set) in shown.iter().enumerate() {
        let labels: Vec<String> = set.iter().map(|f| f.to_string()).collect();
        lines.push(format!("{:>2}. {}", idx + 1, labels.join("  ")));
    }
    lines
}
