//! Source file watcher
//!
//! Binds files on disk to model attributes (`_esm`, `_css`). When a bound
//! file changes, its content is pushed into the model, which in turn fires
//! the controller's hot-reload listeners. Events are debounced on the
//! trailing edge: a file is read once no newer event for it has arrived
//! within the debounce window. A SHA-256 of the last pushed content
//! suppresses pushes for writes that did not change anything.

use hotwidget_kernel::config::WatchConfig;
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use hotwidget_kernel::model::WidgetModel;
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

/// A file bound to a model attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub path: PathBuf,
    pub attribute: String,
}

#[derive(Debug)]
struct BindingState {
    attribute: String,
    last_hash: Option<String>,
    /// Bumped on every event; a pending sync only runs if it is still current
    generation: u64,
}

type Bindings = Arc<RwLock<HashMap<PathBuf, BindingState>>>;

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn watch_error(e: notify::Error) -> WidgetError {
    WidgetError::Watch(e.to_string())
}

/// Pushes edited source files into a model
pub struct SourceWatcher {
    model: Arc<WidgetModel>,
    config: WatchConfig,
    bindings: Bindings,
    watcher: Option<RecommendedWatcher>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl SourceWatcher {
    pub fn new(model: Arc<WidgetModel>, config: WatchConfig) -> Self {
        Self {
            model,
            config,
            bindings: Arc::new(RwLock::new(HashMap::new())),
            watcher: None,
            shutdown_tx: None,
        }
    }

    /// Bind `path` to `attribute`
    ///
    /// The path must exist. Binding does not push anything; call
    /// [`sync`](Self::sync) for that.
    pub async fn bind<P: AsRef<Path>>(&mut self, path: P, attribute: &str) -> WidgetResult<PathBuf> {
        let path = tokio::fs::canonicalize(path.as_ref()).await?;
        info!(path = ?path, attribute, "binding source file");

        self.bindings.write().await.insert(
            path.clone(),
            BindingState {
                attribute: attribute.to_string(),
                last_hash: None,
                generation: 0,
            },
        );

        if let Some(watcher) = self.watcher.as_mut() {
            if let Some(dir) = path.parent() {
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .map_err(watch_error)?;
            }
        }
        Ok(path)
    }

    pub async fn bindings(&self) -> Vec<WatchBinding> {
        self.bindings
            .read()
            .await
            .iter()
            .map(|(path, state)| WatchBinding {
                path: path.clone(),
                attribute: state.attribute.clone(),
            })
            .collect()
    }

    /// Push a bound file into the model if its content changed
    ///
    /// Returns whether the attribute was written.
    pub async fn sync<P: AsRef<Path>>(&self, path: P) -> WidgetResult<bool> {
        let path = tokio::fs::canonicalize(path.as_ref()).await?;
        sync_binding(&self.model, &self.bindings, &path).await
    }

    /// Push every bound file
    pub async fn sync_all(&self) -> WidgetResult<usize> {
        let paths: Vec<PathBuf> = self.bindings.read().await.keys().cloned().collect();
        let mut pushed = 0;
        for path in paths {
            if sync_binding(&self.model, &self.bindings, &path).await? {
                pushed += 1;
            }
        }
        Ok(pushed)
    }

    /// Start watching the directories of all bound files
    pub async fn start(&mut self) -> WidgetResult<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        info!("Starting source watcher");

        let (tx, mut rx) = mpsc::channel::<Event>(1024);
        let watcher_config = Config::default().with_poll_interval(self.config.poll_interval());
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => error!(error = %e, "watch backend error"),
            },
            watcher_config,
        )
        .map_err(watch_error)?;

        let dirs: HashSet<PathBuf> = self
            .bindings
            .read()
            .await
            .keys()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(watch_error)?;
        }
        self.watcher = Some(watcher);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let model = self.model.clone();
        let bindings = self.bindings.clone();
        let debounce = self.config.debounce();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = rx.recv() => {
                        if !is_content_change(&event.kind) {
                            continue;
                        }
                        for path in event.paths {
                            let Some(generation) = mark_pending(&bindings, &path).await else {
                                continue;
                            };
                            let model = model.clone();
                            let bindings = bindings.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(debounce).await;
                                if !is_latest(&bindings, &path, generation).await {
                                    debug!(path = ?path, "debounced");
                                    return;
                                }
                                match sync_binding(&model, &bindings, &path).await {
                                    Ok(true) => info!(path = ?path, "source change pushed"),
                                    Ok(false) => debug!(path = ?path, "source unchanged"),
                                    Err(e) => warn!(path = ?path, error = %e, "failed to push source change"),
                                }
                            });
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Source watcher shutting down");
                        return;
                    }
                    else => return,
                }
            }
        });

        Ok(())
    }

    /// Stop watching
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        self.watcher = None;
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Both))
    )
}

/// Record an event for a bound path and return its generation
async fn mark_pending(bindings: &Bindings, path: &Path) -> Option<u64> {
    let mut bindings = bindings.write().await;
    let state = bindings.get_mut(path)?;
    state.generation += 1;
    Some(state.generation)
}

/// Whether no event for `path` arrived after `generation`
async fn is_latest(bindings: &Bindings, path: &Path, generation: u64) -> bool {
    bindings
        .read()
        .await
        .get(path)
        .is_some_and(|state| state.generation == generation)
}

async fn sync_binding(model: &WidgetModel, bindings: &Bindings, path: &Path) -> WidgetResult<bool> {
    let content = tokio::fs::read_to_string(path).await?;
    let hash = content_hash(&content);

    let attribute = {
        let mut bindings = bindings.write().await;
        let state = bindings
            .get_mut(path)
            .ok_or_else(|| WidgetError::Watch(format!("{} is not bound", path.display())))?;
        if state.last_hash.as_deref() == Some(hash.as_str()) {
            return Ok(false);
        }
        state.last_hash = Some(hash);
        state.attribute.clone()
    };

    model.set_value(&attribute, Value::String(content))?;
    Ok(true)
}
