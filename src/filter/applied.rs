//! Filters as the filter-application side sees them.
//!
//! The history store never parses filter text itself. This is the producer
//! surface it observes: every filter the user typed, whether it is currently
//! applied, whether it parsed, and the parsed parts.

use super::{FilterDescriptor, FilterSet};

/// Comparison operators, longest first so `=~` wins over `=`.
const MATCHERS: [&str; 6] = ["!=", "=~", "!~", ">", "<", "="];

/// Matcher used for fuzzy filters that carry no operator.
const FUZZY_MATCHER: &str = "=";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedFilter {
    pub raw: String,
    pub name: Option<String>,
    pub matcher: String,
    pub value: String,
    pub applied: bool,
    pub is_valid: bool,
}

impl AppliedFilter {
    /// Parse raw filter text into an applied filter.
    ///
    /// `name<op>value` yields a named filter, text without any operator is a
    /// fuzzy filter. A filter whose name has characters outside
    /// `[A-Za-z0-9_@]`, or whose value is empty, is marked invalid.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let Some((idx, op)) = find_matcher(raw) else {
            return Self {
                raw: raw.to_string(),
                name: None,
                matcher: FUZZY_MATCHER.to_string(),
                value: raw.to_string(),
                applied: true,
                is_valid: !raw.is_empty(),
            };
        };

        let name = raw[..idx].trim();
        let value = raw[idx + op.len()..].trim();
        let is_valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
            && !value.is_empty();

        Self {
            raw: raw.to_string(),
            name: Some(name.to_string()),
            matcher: op.to_string(),
            value: value.to_string(),
            applied: true,
            is_valid,
        }
    }

    /// Snapshot of the parts kept in history.
    pub fn to_descriptor(&self) -> FilterDescriptor {
        FilterDescriptor {
            raw: self.raw.clone(),
            name: self.name.clone(),
            matcher: self.matcher.clone(),
            value: self.value.clone(),
        }
    }
}

/// Earliest operator position in `raw`, preferring the longest operator there.
fn find_matcher(raw: &str) -> Option<(usize, &'static str)> {
    raw.char_indices().find_map(|(idx, _)| {
        MATCHERS
            .iter()
            .find(|op| raw[idx..].starts_with(**op))
            .map(|op| (idx, *op))
    })
}

/// Reduce the producer's filters to the set worth remembering.
///
/// Unapplied filters only have raw text and invalid ones can't be labelled,
/// so both are skipped. A missing name is fine (fuzzy filters) but the value
/// must always be set.
pub fn reduce_applied(filters: &[AppliedFilter]) -> FilterSet {
    filters
        .iter()
        .filter(|f| f.applied && f.is_valid && !f.value.is_empty())
        .map(AppliedFilter::to_descriptor)
        .collect()
}
