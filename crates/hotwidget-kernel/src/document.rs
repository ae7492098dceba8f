//! Stylesheet document
//!
//! An in-process model of a page head: an ordered list of style elements,
//! each either a stylesheet link or an inline style block, keyed by a
//! [`StableId`]. The document is shared mutable state; every operation
//! takes the lock briefly and never across an await.

use crate::error::WidgetResult;
use crate::source::StableId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one element in the document
pub type StyleElementId = u64;

/// Content of a style element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleKind {
    /// A stylesheet link; `css` is filled in once the link has loaded
    Link {
        href: String,
        loaded: bool,
        css: Option<String>,
    },
    /// An inline style block
    Inline { text: String },
}

impl StyleKind {
    /// A link that has not loaded yet
    pub fn pending_link(href: &str) -> Self {
        StyleKind::Link {
            href: href.to_string(),
            loaded: false,
            css: None,
        }
    }

    pub fn inline(text: &str) -> Self {
        StyleKind::Inline {
            text: text.to_string(),
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, StyleKind::Link { .. })
    }

    /// Whether the element has settled (inline blocks always have)
    pub fn is_settled(&self) -> bool {
        match self {
            StyleKind::Link { loaded, .. } => *loaded,
            StyleKind::Inline { .. } => true,
        }
    }
}

/// One element in the document head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleElement {
    pub element_id: StyleElementId,
    pub key: StableId,
    pub kind: StyleKind,
}

impl StyleElement {
    /// Link reference or inline text
    pub fn content(&self) -> &str {
        match &self.kind {
            StyleKind::Link { href, .. } => href,
            StyleKind::Inline { text } => text,
        }
    }
}

/// The document head holding all style elements
#[derive(Debug, Default)]
pub struct Document {
    head: RwLock<Vec<StyleElement>>,
    next_id: AtomicU64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> StyleElementId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// First link keyed by `key`, in document order
    pub fn find_link(&self, key: &StableId) -> Option<StyleElement> {
        self.head
            .read()
            .iter()
            .find(|e| &e.key == key && e.kind.is_link())
            .cloned()
    }

    /// First inline style keyed by `key`, in document order
    pub fn find_inline(&self, key: &StableId) -> Option<StyleElement> {
        self.head
            .read()
            .iter()
            .find(|e| &e.key == key && !e.kind.is_link())
            .cloned()
    }

    pub fn get(&self, element_id: StyleElementId) -> Option<StyleElement> {
        self.head
            .read()
            .iter()
            .find(|e| e.element_id == element_id)
            .cloned()
    }

    /// Append an element at the end of the head
    pub fn append(&self, key: StableId, kind: StyleKind) -> StyleElementId {
        let element_id = self.allocate_id();
        self.head.write().push(StyleElement {
            element_id,
            key,
            kind,
        });
        element_id
    }

    /// Insert an element directly after `anchor`
    ///
    /// Falls back to appending when `anchor` is no longer in the document.
    pub fn insert_after(
        &self,
        anchor: StyleElementId,
        key: StableId,
        kind: StyleKind,
    ) -> StyleElementId {
        let element_id = self.allocate_id();
        let element = StyleElement {
            element_id,
            key,
            kind,
        };
        let mut head = self.head.write();
        match head.iter().position(|e| e.element_id == anchor) {
            Some(pos) => head.insert(pos + 1, element),
            None => head.push(element),
        }
        element_id
    }

    /// Replace the text of an inline element; false if it is gone or a link
    pub fn replace_text(&self, element_id: StyleElementId, new_text: &str) -> bool {
        let mut head = self.head.write();
        match head.iter_mut().find(|e| e.element_id == element_id) {
            Some(StyleElement {
                kind: StyleKind::Inline { text },
                ..
            }) => {
                *text = new_text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Mark a link as loaded with the fetched stylesheet; false if it is gone
    pub fn mark_loaded(&self, element_id: StyleElementId, fetched: String) -> bool {
        let mut head = self.head.write();
        match head.iter_mut().find(|e| e.element_id == element_id) {
            Some(StyleElement {
                kind: StyleKind::Link { loaded, css, .. },
                ..
            }) => {
                *loaded = true;
                *css = Some(fetched);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, element_id: StyleElementId) -> bool {
        let mut head = self.head.write();
        let before = head.len();
        head.retain(|e| e.element_id != element_id);
        head.len() != before
    }

    /// Remove every settled element keyed by `key` except `keep`
    ///
    /// Links still loading are left alone; they settle the key themselves
    /// when they finish. Returns the number of removed elements.
    pub fn retain_only(&self, key: &StableId, keep: StyleElementId) -> usize {
        let mut head = self.head.write();
        let before = head.len();
        head.retain(|e| &e.key != key || e.element_id == keep || !e.kind.is_settled());
        before - head.len()
    }

    /// All elements keyed by `key`, in document order
    pub fn elements_for(&self, key: &StableId) -> Vec<StyleElement> {
        self.head
            .read()
            .iter()
            .filter(|e| &e.key == key)
            .cloned()
            .collect()
    }

    /// Snapshot of the whole head
    pub fn head(&self) -> Vec<StyleElement> {
        self.head.read().clone()
    }

    pub fn len(&self) -> usize {
        self.head.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.read().is_empty()
    }
}

/// Fetches linked stylesheets
///
/// Completion of [`fetch`](StylesheetFetcher::fetch) is the link's load
/// event.
#[async_trait::async_trait]
pub trait StylesheetFetcher: Send + Sync {
    async fn fetch(&self, href: &str) -> WidgetResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StableId {
        StableId::new("w1")
    }

    #[test]
    fn test_insert_after_keeps_order() {
        let doc = Document::new();
        let first = doc.append(key(), StyleKind::pending_link("https://a/1.css"));
        let _other = doc.append(StableId::new("w2"), StyleKind::inline("p{}"));
        let second = doc.insert_after(first, key(), StyleKind::pending_link("https://a/2.css"));

        let ids: Vec<_> = doc.head().iter().map(|e| e.element_id).collect();
        assert_eq!(ids[0], first);
        assert_eq!(ids[1], second);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_insert_after_missing_anchor_appends() {
        let doc = Document::new();
        doc.append(key(), StyleKind::inline("a{}"));
        let id = doc.insert_after(999, key(), StyleKind::inline("b{}"));
        assert_eq!(doc.head().last().unwrap().element_id, id);
    }

    #[test]
    fn test_retain_only_skips_pending_links() {
        let doc = Document::new();
        let inline = doc.append(key(), StyleKind::inline("a{}"));
        let pending = doc.append(key(), StyleKind::pending_link("https://a/x.css"));
        let settled = doc.append(key(), StyleKind::inline("b{}"));

        let removed = doc.retain_only(&key(), settled);
        assert_eq!(removed, 1);
        assert!(doc.get(inline).is_none());
        assert!(doc.get(pending).is_some());

        assert!(doc.mark_loaded(pending, "x{}".to_string()));
        doc.retain_only(&key(), pending);
        assert_eq!(doc.elements_for(&key()).len(), 1);
    }

    #[test]
    fn test_replace_text_only_touches_inline() {
        let doc = Document::new();
        let link = doc.append(key(), StyleKind::pending_link("https://a/x.css"));
        let inline = doc.append(key(), StyleKind::inline("a{}"));

        assert!(!doc.replace_text(link, "nope"));
        assert!(doc.replace_text(inline, "b{}"));
        assert_eq!(doc.find_inline(&key()).unwrap().content(), "b{}");
    }
}
