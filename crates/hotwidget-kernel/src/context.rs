//! Context bridge
//!
//! Builds the capability object passed to a module's entry point: model
//! accessors, an event pair bound to the owning view, the widget manager
//! and the view's root element.
//!
//! A [`RenderContext`] is built fresh for every invocation and handed over
//! by value. It must not be kept past the invocation that received it:
//! a module that captures its context in a closure and uses it after the
//! next reload is operating on a scope that no longer exists. Nothing
//! prevents this structurally; listeners registered through a stale
//! handle are still removed on the next reload because they are keyed by
//! the view.

use crate::bus::{EventKind, Listener, ListenerOwner, SubscriptionId, ViewId};
use crate::element::Element;
use crate::error::WidgetResult;
use crate::manager::WidgetManager;
use crate::model::WidgetModel;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Model capabilities bound to one view
#[derive(Clone, Debug)]
pub struct ModelHandle {
    model: Arc<WidgetModel>,
    view_id: ViewId,
}

impl ModelHandle {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.model.get(key)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> WidgetResult<()> {
        self.model.set(key, value)
    }

    pub fn save_changes(&self) -> WidgetResult<()> {
        self.model.save_changes()
    }

    pub fn send(&self, content: Value, buffers: Vec<Vec<u8>>) -> WidgetResult<()> {
        self.model.send(content, buffers)
    }

    /// Subscribe to an event on behalf of the owning view
    pub fn on(&self, event: &str, listener: Listener) -> SubscriptionId {
        self.model.on(
            EventKind::parse(event),
            ListenerOwner::View(self.view_id),
            listener,
        )
    }

    /// Remove the owning view's listeners for `event`, or all of them
    pub fn off(&self, event: Option<&str>) -> usize {
        let kind = event.map(EventKind::parse);
        self.model
            .off(kind.as_ref(), ListenerOwner::View(self.view_id))
    }

    pub fn widget_manager(&self) -> Option<Arc<WidgetManager>> {
        self.model.widget_manager()
    }

    pub fn model_id(&self) -> &str {
        self.model.id()
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }
}

/// Argument of a module's entry point
#[derive(Debug)]
pub struct RenderContext {
    pub model: ModelHandle,
    pub el: Element,
}

/// Constructs render contexts
pub struct ContextBridge;

impl ContextBridge {
    pub fn build(model: &Arc<WidgetModel>, view_id: ViewId, el: &Element) -> RenderContext {
        RenderContext {
            model: ModelHandle {
                model: model.clone(),
                view_id,
            },
            el: el.clone(),
        }
    }
}
