//! Typed errors for the widget lifecycle.

use thiserror::Error;

/// Errors that can occur while loading, rendering, reloading or disposing a
/// widget.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WidgetError {
    /// A remote module or stylesheet could not be fetched.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Module source failed to compile.
    #[error("Failed to compile module {origin}: {message}")]
    Compile { origin: String, message: String },

    /// The module does not define the entry point.
    #[error("Module {origin} does not define entry point `{entry_point}`")]
    MissingEntryPoint { origin: String, entry_point: String },

    /// The model has no value for a required source attribute.
    #[error("Model attribute `{0}` holds no source")]
    MissingSource(String),

    /// A stylesheet could not be applied.
    #[error("Failed to apply stylesheet for {id}: {reason}")]
    StyleLoad { id: String, reason: String },

    /// The module's entry point failed.
    #[error("Entry point failed: {0}")]
    EntryPoint(String),

    /// The previous module's cleanup failed.
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// A state attribute could not be serialized.
    #[error("Failed to serialize attribute `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The host backend rejected an operation.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A lifecycle transition is not allowed from the current phase.
    #[error("Invalid view transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// An element would become its own descendant.
    #[error("Cannot append <{child}> inside its own subtree")]
    Hierarchy { child: String },

    /// The view has already been disposed.
    #[error("View {0} has been disposed")]
    ViewDisposed(String),

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source watcher failed.
    #[error("Watch error: {0}")]
    Watch(String),

    /// An I/O error surfaced while materializing or reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;

impl WidgetError {
    /// Whether this error is a load failure (fetch, compile, missing export)
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            WidgetError::Fetch { .. }
                | WidgetError::Compile { .. }
                | WidgetError::MissingEntryPoint { .. }
                | WidgetError::MissingSource(_)
                | WidgetError::Io(_)
        )
    }
}
