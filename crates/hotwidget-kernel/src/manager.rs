//! Widget manager
//!
//! Registry of live models, reachable from a module through its context.

use crate::model::{ModelBackend, WidgetModel};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of models by id
#[derive(Debug, Default)]
pub struct WidgetManager {
    models: RwLock<HashMap<String, Arc<WidgetModel>>>,
}

impl WidgetManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a model over `backend` and register it
    pub fn create_model(self: &Arc<Self>, backend: Arc<dyn ModelBackend>) -> Arc<WidgetModel> {
        let model = WidgetModel::new(backend);
        self.register(model.clone());
        model
    }

    /// Register an existing model, replacing any model with the same id
    pub fn register(self: &Arc<Self>, model: Arc<WidgetModel>) {
        model.attach_manager(Arc::downgrade(self));
        debug!(model_id = %model.id(), "model registered");
        self.models.write().insert(model.id().to_string(), model);
    }

    pub fn get_model(&self, id: &str) -> Option<Arc<WidgetModel>> {
        self.models.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<WidgetModel>> {
        self.models.write().remove(id)
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.models.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}
