//! Typed subscription registry
//!
//! Listeners are keyed by `(EventKind, ListenerOwner)`, so all listeners a
//! view registered can be removed without touching those of other views
//! of the same model.

use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Identity of one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Event kinds a listener can subscribe to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A named attribute changed (`change:<name>`)
    Change(String),
    /// A custom message arrived from the back end (`msg:custom`)
    CustomMessage,
    /// Any other named event
    Named(String),
}

impl EventKind {
    pub fn change(attribute: &str) -> Self {
        EventKind::Change(attribute.to_string())
    }

    /// Parse an event name such as `change:value` or `msg:custom`
    pub fn parse(name: &str) -> Self {
        if let Some(attribute) = name.strip_prefix("change:") {
            EventKind::Change(attribute.to_string())
        } else if name == "msg:custom" {
            EventKind::CustomMessage
        } else {
            EventKind::Named(name.to_string())
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Change(attribute) => write!(f, "change:{}", attribute),
            EventKind::CustomMessage => f.write_str("msg:custom"),
            EventKind::Named(name) => f.write_str(name),
        }
    }
}

/// Who registered a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerOwner {
    /// The model itself (instance-level listeners such as hot reload)
    Model,
    /// One view of the model
    View(ViewId),
}

/// Callback invoked with the event payload
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle of one subscription
pub type SubscriptionId = u64;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    owner: ListenerOwner,
    listener: Listener,
}

/// Listener registry keyed by event kind and owner
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(
        &self,
        kind: EventKind,
        owner: ListenerOwner,
        listener: Listener,
    ) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.subscriptions.write().push(Subscription {
            id,
            kind,
            owner,
            listener,
        });
        id
    }

    /// Remove listeners of `owner`, for one kind or for all kinds
    ///
    /// Returns the number of removed listeners.
    pub fn unsubscribe(&self, kind: Option<&EventKind>, owner: ListenerOwner) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.owner != owner || kind.is_some_and(|k| &s.kind != k));
        before - subscriptions.len()
    }

    /// Remove one subscription by handle
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Invoke every listener registered for `kind`
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe. Returns the number of invoked listeners.
    pub fn emit(&self, kind: &EventKind, payload: &Value) -> usize {
        let listeners: Vec<Listener> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| &s.kind == kind)
            .map(|s| s.listener.clone())
            .collect();

        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    /// Number of listeners registered by `owner`
    pub fn count_for(&self, owner: ListenerOwner) -> usize {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| s.owner == owner)
            .count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Arc::new(move |_: &Value| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_parse_event_kind() {
        assert_eq!(EventKind::parse("change:value"), EventKind::change("value"));
        assert_eq!(EventKind::parse("msg:custom"), EventKind::CustomMessage);
        assert_eq!(
            EventKind::parse("destroy"),
            EventKind::Named("destroy".to_string())
        );
        assert_eq!(EventKind::change("_esm").to_string(), "change:_esm");
    }

    #[test]
    fn test_unsubscribe_is_scoped_to_owner() {
        let registry = SubscriptionRegistry::new();
        let view_a = ViewId::new();
        let view_b = ViewId::new();
        let (a_count, a) = counter();
        let (b_count, b) = counter();

        registry.subscribe(EventKind::change("x"), ListenerOwner::View(view_a), a);
        registry.subscribe(EventKind::change("x"), ListenerOwner::View(view_b), b);

        assert_eq!(registry.unsubscribe(None, ListenerOwner::View(view_a)), 1);
        registry.emit(&EventKind::change("x"), &Value::Null);

        assert_eq!(a_count.load(Ordering::SeqCst), 0);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_single_kind() {
        let registry = SubscriptionRegistry::new();
        let view = ListenerOwner::View(ViewId::new());
        let (_, x) = counter();
        let (y_count, y) = counter();

        registry.subscribe(EventKind::change("x"), view, x);
        registry.subscribe(EventKind::change("y"), view, y);

        assert_eq!(registry.unsubscribe(Some(&EventKind::change("x")), view), 1);
        assert_eq!(registry.count_for(view), 1);

        registry.emit(&EventKind::change("y"), &Value::Null);
        assert_eq!(y_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let r = registry.clone();
        registry.subscribe(
            EventKind::CustomMessage,
            ListenerOwner::Model,
            Arc::new(move |_: &Value| {
                r.unsubscribe(None, ListenerOwner::Model);
            }),
        );

        assert_eq!(registry.emit(&EventKind::CustomMessage, &Value::Null), 1);
        assert!(registry.is_empty());
    }
}
