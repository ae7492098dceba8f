//! hotwidget kernel
//!
//! Core contracts shared by the widget runtime and its hosts:
//! - Source classification (remote reference vs. inline text)
//! - The headless element tree and the keyed stylesheet document
//! - The typed subscription registry and the composed widget model
//! - The context handed to a module's entry point
//! - Module and cleanup-handle traits, errors, events and configuration

// source module
pub mod source;
pub use source::*;

// element module
pub mod element;
pub use element::Element;

// document module
pub mod document;
pub use document::*;

// bus module
pub mod bus;
pub use bus::*;

// model module
pub mod model;
pub use model::*;

// manager module
pub mod manager;
pub use manager::WidgetManager;

// context module
pub mod context;
pub use context::*;

// module contract
pub mod module;
pub use module::*;

// event module
pub mod event;
pub use event::WidgetEvent;

// error module
pub mod error;
pub use error::{WidgetError, WidgetResult};

// config module
pub mod config;
pub use self::config::{HotwidgetConfig, HttpConfig, LoaderConfig, ScriptConfig, WatchConfig};
