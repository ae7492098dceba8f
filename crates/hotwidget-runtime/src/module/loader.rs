//! Module loader
//!
//! Remote modules are fetched and compiled directly. Inline text is first
//! materialized into a temporary `*.rhai` file, imported from there, and
//! the file is released as soon as the import settles.

use super::script::{ScriptModule, ScriptProgram, build_engine};
use crate::fetch::HttpFetcher;
use async_trait::async_trait;
use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_kernel::error::WidgetResult;
use hotwidget_kernel::module::{ModuleLoader, WidgetModule};
use hotwidget_kernel::source::ModuleSource;
use rhai::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// A materialized inline module
///
/// The backing file is deleted when the handle drops, on every exit path
/// of the import including cancellation.
pub struct TempModuleHandle {
    file: NamedTempFile,
    live: Arc<AtomicUsize>,
}

impl TempModuleHandle {
    fn create(dir: Option<&Path>, live: Arc<AtomicUsize>) -> WidgetResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("hotwidget-").suffix(".rhai");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        live.fetch_add(1, Ordering::SeqCst);
        debug!(path = ?file.path(), "inline module materialized");
        Ok(Self { file, live })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for TempModuleHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!(path = ?self.file.path(), "inline module released");
    }
}

/// Loads Rhai widget modules
pub struct ScriptModuleLoader {
    engine: Arc<Engine>,
    fetcher: HttpFetcher,
    temp_dir: Option<PathBuf>,
    entry_point: String,
    live: Arc<AtomicUsize>,
}

impl ScriptModuleLoader {
    pub fn new(config: &HotwidgetConfig) -> WidgetResult<Self> {
        Ok(Self::with_fetcher(config, HttpFetcher::new(&config.http)?))
    }

    pub fn with_fetcher(config: &HotwidgetConfig, fetcher: HttpFetcher) -> Self {
        Self {
            engine: Arc::new(build_engine(&config.script)),
            fetcher,
            temp_dir: config.loader.temp_dir.clone(),
            entry_point: config.script.entry_point.clone(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of materialized inline modules not yet released
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn compile(&self, origin: &str, text: &str) -> WidgetResult<ScriptModule> {
        let program = ScriptProgram::compile(self.engine.clone(), origin, text, &self.entry_point)?;
        Ok(ScriptModule::new(program))
    }

    async fn load_remote(&self, url: &str) -> WidgetResult<ScriptModule> {
        let text = self.fetcher.fetch_text(url).await?;
        self.compile(url, &text)
    }

    async fn load_inline(&self, text: &str) -> WidgetResult<ScriptModule> {
        let handle = TempModuleHandle::create(self.temp_dir.as_deref(), self.live.clone())?;
        let result = self.import(&handle, text).await;
        drop(handle);

        if let Err(e) = &result {
            error!(error = %e, "Failed to load inline module");
        }
        result
    }

    async fn import(&self, handle: &TempModuleHandle, text: &str) -> WidgetResult<ScriptModule> {
        tokio::fs::write(handle.path(), text).await?;
        let materialized = tokio::fs::read_to_string(handle.path()).await?;
        let origin = handle.path().display().to_string();
        self.compile(&origin, &materialized)
    }
}

#[async_trait]
impl ModuleLoader for ScriptModuleLoader {
    async fn load(&self, source: &ModuleSource) -> WidgetResult<Arc<dyn WidgetModule>> {
        let module = match source {
            ModuleSource::Remote(url) => self.load_remote(url).await?,
            ModuleSource::Inline(text) => self.load_inline(text).await?,
        };
        info!(source = %source, "module loaded");
        Ok(Arc::new(module))
    }
}
