//! Widget model
//!
//! [`WidgetModel`] composes a host-provided [`ModelBackend`] (attribute
//! storage and the outgoing channel) with change notification and the
//! typed listener registry. Hosts inject their backend instead of
//! extending a base type.

use crate::bus::{EventKind, Listener, ListenerOwner, SubscriptionId, SubscriptionRegistry};
use crate::error::{WidgetError, WidgetResult};
use crate::manager::WidgetManager;
use crate::source::{Source, StableId};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Attribute holding the module source
pub const ESM_ATTRIBUTE: &str = "_esm";
/// Attribute holding the stylesheet source
pub const CSS_ATTRIBUTE: &str = "_css";
/// Attribute holding the stable identifier
pub const ID_ATTRIBUTE: &str = "_anywidget_id";

/// Host-provided state storage and messaging
///
/// This is the only surface the core assumes of the host: attribute read
/// and write, flushing pending changes, and an outgoing message channel.
pub trait ModelBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> WidgetResult<()>;

    /// Flush pending attribute changes to the other side
    fn save_changes(&self) -> WidgetResult<()>;

    /// Forward an outgoing custom message
    fn send(&self, content: Value, buffers: Vec<Vec<u8>>) -> WidgetResult<()>;
}

/// One logical widget instance
pub struct WidgetModel {
    id: String,
    backend: Arc<dyn ModelBackend>,
    listeners: SubscriptionRegistry,
    manager: RwLock<Weak<WidgetManager>>,
}

impl WidgetModel {
    /// Create a model with a generated id
    pub fn new(backend: Arc<dyn ModelBackend>) -> Arc<Self> {
        Self::with_id(&uuid::Uuid::now_v7().to_string(), backend)
    }

    pub fn with_id(id: &str, backend: Arc<dyn ModelBackend>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            backend,
            listeners: SubscriptionRegistry::new(),
            manager: RwLock::new(Weak::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.backend.get(key)
    }

    /// Read an attribute into a typed value; `None` if absent or mismatched
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    /// Write an attribute and notify `change:<key>` listeners if it changed
    ///
    /// Serialization failures are logged with the offending key and
    /// returned.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> WidgetResult<()> {
        let value = serialize_attribute(key, &value)?;
        self.set_value(key, value)
    }

    /// Write an already-serialized attribute
    pub fn set_value(&self, key: &str, value: Value) -> WidgetResult<()> {
        if self.backend.get(key).as_ref() == Some(&value) {
            debug!(model_id = %self.id, key, "attribute unchanged");
            return Ok(());
        }
        self.backend.set(key, value.clone())?;
        let notified = self.listeners.emit(&EventKind::change(key), &value);
        debug!(model_id = %self.id, key, notified, "attribute changed");
        Ok(())
    }

    /// Serialize a batch of state attributes
    ///
    /// The first failing key is logged and its error returned.
    pub fn serialize_state<'a, T, I>(&self, state: I) -> WidgetResult<Map<String, Value>>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a str, &'a T)>,
    {
        let mut out = Map::new();
        for (key, value) in state {
            out.insert(key.to_string(), serialize_attribute(key, value)?);
        }
        Ok(out)
    }

    pub fn save_changes(&self) -> WidgetResult<()> {
        self.backend.save_changes()
    }

    /// Write a batch of attributes and flush them to the host
    ///
    /// Every value is serialized before anything is written, so a failing
    /// key leaves the model untouched and nothing is flushed.
    pub fn save_state<'a, T, I>(&self, state: I) -> WidgetResult<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a str, &'a T)>,
    {
        let values = self.serialize_state(state)?;
        for (key, value) in values {
            self.set_value(&key, value)?;
        }
        self.save_changes()
    }

    pub fn send(&self, content: Value, buffers: Vec<Vec<u8>>) -> WidgetResult<()> {
        self.backend.send(content, buffers)
    }

    /// Deliver an incoming custom message to `msg:custom` listeners
    pub fn receive_message(&self, content: &Value) -> usize {
        self.listeners.emit(&EventKind::CustomMessage, content)
    }

    pub fn on(&self, kind: EventKind, owner: ListenerOwner, listener: Listener) -> SubscriptionId {
        self.listeners.subscribe(kind, owner, listener)
    }

    /// Remove listeners of `owner`, for one kind or for all kinds
    pub fn off(&self, kind: Option<&EventKind>, owner: ListenerOwner) -> usize {
        self.listeners.unsubscribe(kind, owner)
    }

    /// Remove one subscription by handle
    pub fn off_subscription(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listeners(&self) -> &SubscriptionRegistry {
        &self.listeners
    }

    /// Current module source
    pub fn module_source(&self) -> Option<Source> {
        self.get(ESM_ATTRIBUTE).as_ref().and_then(Source::from_value)
    }

    /// Current stylesheet source
    pub fn style_source(&self) -> Option<Source> {
        self.get(CSS_ATTRIBUTE).as_ref().and_then(Source::from_value)
    }

    /// Stable identifier; absent disables hot updates and styling
    pub fn stable_id(&self) -> Option<StableId> {
        let value = self.get(ID_ATTRIBUTE)?;
        StableId::from_optional(value.as_str())
    }

    pub fn widget_manager(&self) -> Option<Arc<WidgetManager>> {
        self.manager.read().upgrade()
    }

    pub(crate) fn attach_manager(&self, manager: Weak<WidgetManager>) {
        *self.manager.write() = manager;
    }
}

fn serialize_attribute<T: Serialize + ?Sized>(key: &str, value: &T) -> WidgetResult<Value> {
    serde_json::to_value(value).map_err(|source| {
        error!(key, error = %source, "Error serializing widget state attribute");
        WidgetError::Serialization {
            key: key.to_string(),
            source,
        }
    })
}

impl fmt::Debug for WidgetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetModel")
            .field("id", &self.id)
            .field("listeners", &self.listeners)
            .finish()
    }
}
