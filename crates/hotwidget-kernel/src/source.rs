//! Resource locator
//!
//! Classifies module and stylesheet sources as remote references or inline
//! text. Classification is a pure string predicate: no network or filesystem
//! access happens here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme prefixes treated as fetchable references
pub const REMOTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Returns true if `s` denotes a remote reference
pub fn is_remote(s: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| s.starts_with(scheme))
}

/// A module or stylesheet source
///
/// Sources are immutable: an update replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// A reference beginning with `http://` or `https://`
    Remote(String),
    /// Literal source text
    Inline(String),
}

/// Executable module source (script text or a reference to it)
pub type ModuleSource = Source;

/// Stylesheet source (CSS text or a reference to it)
pub type StyleSource = Source;

impl Source {
    /// Classify a string
    pub fn classify(s: impl Into<String>) -> Self {
        let s = s.into();
        if is_remote(&s) {
            Source::Remote(s)
        } else {
            Source::Inline(s)
        }
    }

    /// Classify an optional string, treating empty text as absent
    pub fn from_optional(s: Option<&str>) -> Option<Self> {
        match s {
            Some(s) if !s.is_empty() => Some(Self::classify(s)),
            _ => None,
        }
    }

    /// Classify a model attribute value
    ///
    /// Non-string and empty values are absent.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        Self::from_optional(value.as_str())
    }

    /// Whether this is a remote reference
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Remote(_))
    }

    /// The raw string, reference or text
    pub fn as_str(&self) -> &str {
        match self {
            Source::Remote(s) | Source::Inline(s) => s,
        }
    }

    /// Short label for logs: the URL, or the length of inline text
    pub fn label(&self) -> String {
        match self {
            Source::Remote(url) => url.clone(),
            Source::Inline(text) => format!("<inline {} bytes>", text.len()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Stable identifier of one logical widget instance across all its views
///
/// Used as the document key for style elements so that re-injection
/// replaces rather than duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an optional string, treating empty text as absent
    pub fn from_optional(s: Option<&str>) -> Option<Self> {
        s.filter(|s| !s.is_empty()).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StableId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/widget.rhai"));
        assert!(is_remote("https://cdn.example.com/style.css"));

        assert!(!is_remote("fn render(ctx) {}"));
        assert!(!is_remote("div { color: red }"));
        assert!(!is_remote("ftp://example.com/x"));
        assert!(!is_remote("HTTP://EXAMPLE.COM"));
        assert!(!is_remote(" https://leading-space.com"));
        assert!(!is_remote(""));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            Source::classify("https://a.b/c.rhai"),
            Source::Remote("https://a.b/c.rhai".to_string())
        );
        assert_eq!(
            Source::classify("let x = 1;"),
            Source::Inline("let x = 1;".to_string())
        );
    }

    #[test]
    fn test_from_value_treats_empty_as_absent() {
        assert!(Source::from_value(&serde_json::json!("")).is_none());
        assert!(Source::from_value(&serde_json::Value::Null).is_none());
        assert!(Source::from_value(&serde_json::json!(42)).is_none());

        let source = Source::from_value(&serde_json::json!("div{}")).unwrap();
        assert!(!source.is_remote());
        assert_eq!(source.as_str(), "div{}");
    }

    #[test]
    fn test_stable_id() {
        assert!(StableId::from_optional(None).is_none());
        assert!(StableId::from_optional(Some("")).is_none());
        assert_eq!(StableId::from_optional(Some("w1")).unwrap().as_str(), "w1");
    }
}
