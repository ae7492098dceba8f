use crate::bus::ViewId;
use std::time::Duration;

/// Lifecycle event broadcast by a widget controller
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum WidgetEvent {
    /// A stylesheet was applied for the model
    StyleApplied { model_id: String, stable_id: String },
    /// Applying a stylesheet failed
    StyleFailed { model_id: String, error: String },
    /// A view's entry point completed
    RenderCompleted {
        model_id: String,
        view_id: ViewId,
        generation: u64,
    },
    /// A view's render or reload failed
    RenderFailed {
        model_id: String,
        view_id: ViewId,
        error: String,
    },
    /// A view's previous cleanup failed and was discarded
    CleanupFailed {
        model_id: String,
        view_id: ViewId,
        error: String,
    },
    /// A module reload started for all live views
    ReloadStarted { model_id: String, views: usize },
    /// A module reload finished for all live views
    ReloadCompleted {
        model_id: String,
        reloaded: usize,
        failed: usize,
        duration: Duration,
    },
    /// A view was disposed
    ViewDisposed { model_id: String, view_id: ViewId },
}
