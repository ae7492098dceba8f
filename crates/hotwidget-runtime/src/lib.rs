//! hotwidget runtime
//!
//! Engines behind the kernel contracts:
//! - [`style::StyleLoader`] keeps one style element per stable id
//! - [`module::ScriptModuleLoader`] loads Rhai modules from URLs or inline text
//! - [`lifecycle::WidgetController`] drives render, hot reload and disposal
//! - [`watcher::SourceWatcher`] pushes edited source files into a model
//! - [`backend::MemoryBackend`] is an in-process host backend

pub mod backend;
pub mod fetch;
pub mod lifecycle;
pub mod logging;
pub mod module;
pub mod style;
pub mod watcher;

pub use backend::{MemoryBackend, Outgoing};
pub use fetch::HttpFetcher;
pub use lifecycle::{ReloadReport, ViewOutcome, ViewPhase, WidgetController, WidgetView};
pub use module::{ScriptModule, ScriptModuleLoader};
pub use style::StyleLoader;
pub use watcher::{SourceWatcher, WatchBinding};

pub use hotwidget_kernel as kernel;
