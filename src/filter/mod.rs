//! Filter descriptors and filter sets.
//!
//! A `FilterDescriptor` is the normalized snapshot of one applied filter that
//! is kept for redisplay in the history menu. A `FilterSet` is every filter
//! applied at one moment, in the order the user applied them.

mod applied;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use applied::{reduce_applied, AppliedFilter};

/// One filter condition as it is stored in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// Original text the user typed, re-parsed when the set is re-applied.
    pub raw: String,
    /// Matched label name. Fuzzy (free-text) filters have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub matcher: String,
    pub value: String,
}

impl FilterDescriptor {
    pub fn new(
        raw: impl Into<String>,
        name: Option<String>,
        matcher: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            name,
            matcher: matcher.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}{}", name, self.matcher, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// All filters applied at one moment. Order matters for equality.
pub type FilterSet = Vec<FilterDescriptor>;

/// Compact JSON form of a filter set, used to compare sets by content.
pub fn canonical(set: &[FilterDescriptor]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(set)?)
}

/// Raw texts of a filter set, in order, ready to be re-parsed.
pub fn raw_filters(set: &[FilterDescriptor]) -> Vec<String> {
    set.iter().map(|f| f.raw.clone()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_order() {
        let set = vec![FilterDescriptor::new("a=1", Some("a".to_string()), "=", "1")];
        assert_eq!(
            canonical(&set).unwrap(),
            r#"[{"raw":"a=1","name":"a","matcher":"=","value":"1"}]"#
        );
    }

    #[test]
    fn test_canonical_omits_missing_name() {
        let set = vec![FilterDescriptor::new("disk", None, "=", "disk")];
        assert_eq!(
            canonical(&set).unwrap(),
            r#"[{"raw":"disk","matcher":"=","value":"disk"}]"#
        );
    }

    #[test]
    fn test_canonical_is_order_sensitive() {
        let a = FilterDescriptor::new("a=1", Some("a".to_string()), "=", "1");
        let b = FilterDescriptor::new("b=2", Some("b".to_string()), "=", "2");
        assert_ne!(
            canonical(&[a.clone(), b.clone()]).unwrap(),
            canonical(&[b, a]).unwrap()
        );
    }

    #[test]
    fn test_display_label() {
        let named = FilterDescriptor::new("@state=active", Some("@state".to_string()), "=", "active");
        assert_eq!(named.to_string(), "@state=active");

        let fuzzy = FilterDescriptor::new("disk", None, "=", "disk");
        assert_eq!(fuzzy.to_string(), "disk");
    }

    #[test]
    fn test_deserialize_without_name() {
        let json = r#"{"raw":"cpu","matcher":"=","value":"cpu"}"#;
        let f: FilterDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(f.name, None);
        assert_eq!(f.value, "cpu");
    }
}
