//! View lifecycle: render, hot reload and disposal

mod controller;
mod report;
mod view;

pub use controller::{ROOT_TAG, WidgetController};
pub use report::{ReloadReport, ViewOutcome};
pub use view::{ViewPhase, WidgetView};
