//! Headless element tree
//!
//! The root visual element handed to a module. Elements are shared handles:
//! cloning an [`Element`] yields another handle to the same node, so a
//! module that keeps its element inside a cleanup closure mutates the tree
//! the host renders.

use crate::error::{WidgetError, WidgetResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Node {
    tag: String,
    text: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
}

/// A shared handle to one element node
#[derive(Clone, Default)]
pub struct Element {
    node: Arc<RwLock<Node>>,
}

impl Element {
    /// Create a detached element with the given tag
    pub fn new(tag: &str) -> Self {
        Self {
            node: Arc::new(RwLock::new(Node {
                tag: tag.to_string(),
                ..Default::default()
            })),
        }
    }

    pub fn tag(&self) -> String {
        self.node.read().tag.clone()
    }

    /// Concatenated text of this element and all descendants
    pub fn text_content(&self) -> String {
        let node = self.node.read();
        let mut text = node.text.clone();
        for child in &node.children {
            text.push_str(&child.text_content());
        }
        text
    }

    /// Replace all content with a single text run
    pub fn set_text_content(&self, text: &str) {
        let mut node = self.node.write();
        node.children.clear();
        node.text = text.to_string();
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.node.read().attributes.get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.node
            .write()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&self, name: &str) -> Option<String> {
        self.node.write().attributes.remove(name)
    }

    /// Append an existing element as the last child
    ///
    /// Fails when `self` is `child` or one of its descendants.
    pub fn append_child(&self, child: Element) -> WidgetResult<()> {
        if child.contains(self) {
            return Err(WidgetError::Hierarchy { child: child.tag() });
        }
        self.node.write().children.push(child);
        Ok(())
    }

    /// Create a new child element and return a handle to it
    pub fn create_child(&self, tag: &str) -> Element {
        let child = Element::new(tag);
        self.node.write().children.push(child.clone());
        child
    }

    /// Whether `other` is this element or lies in its subtree
    pub fn contains(&self, other: &Element) -> bool {
        self.ptr_eq(other) || self.node.read().children.iter().any(|c| c.contains(other))
    }

    pub fn children(&self) -> Vec<Element> {
        self.node.read().children.clone()
    }

    /// Remove all content (text and children), keeping tag and attributes
    pub fn clear(&self) {
        let mut node = self.node.write();
        node.text.clear();
        node.children.clear();
    }

    pub fn is_empty(&self) -> bool {
        let node = self.node.read();
        node.text.is_empty() && node.children.is_empty()
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Serialize the subtree as markup
    pub fn to_html(&self) -> String {
        let node = self.node.read();
        let tag = if node.tag.is_empty() { "div" } else { &node.tag };
        let mut out = format!("<{}", tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
        }
        out.push('>');
        out.push_str(&escape(&node.text));
        for child in &node.children {
            out.push_str(&child.to_html());
        }
        out.push_str(&format!("</{}>", tag));
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("html", &self.to_html())
            .finish()
    }
}
