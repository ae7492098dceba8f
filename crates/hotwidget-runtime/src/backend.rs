//! In-process host backend

use hotwidget_kernel::error::WidgetResult;
use hotwidget_kernel::model::ModelBackend;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

/// Something the widget pushed towards the other side
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A custom message sent through the context
    Message {
        content: Value,
        buffers: Vec<Vec<u8>>,
    },
    /// A snapshot of the state flushed by `save_changes`
    Saved(Map<String, Value>),
}

/// Attribute storage in memory, with an outbox instead of a channel
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<Map<String, Value>>,
    outbox: Mutex<Vec<Outgoing>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with initial attributes
    pub fn with_state<K, I>(state: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            state: RwLock::new(state.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.state.read().clone()
    }

    /// Take everything sent or saved so far
    pub fn drain_outbox(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

impl ModelBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.state.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> WidgetResult<()> {
        self.state.write().insert(key.to_string(), value);
        Ok(())
    }

    fn save_changes(&self) -> WidgetResult<()> {
        let snapshot = self.snapshot();
        self.outbox.lock().push(Outgoing::Saved(snapshot));
        Ok(())
    }

    fn send(&self, content: Value, buffers: Vec<Vec<u8>>) -> WidgetResult<()> {
        self.outbox.lock().push(Outgoing::Message { content, buffers });
        Ok(())
    }
}
