//! Rhai widget modules and their loader

mod loader;
mod script;

pub use loader::{ScriptModuleLoader, TempModuleHandle};
pub use script::{ScriptModel, ScriptModule, ScriptProgram, build_engine};
