//! Lifecycle controller
//!
//! Drives every view of one model through render, hot reload and
//! disposal. Each view's transitions run under that view's lock, so a
//! view's previous cleanup always completes before its next entry point
//! starts. Views of the same model reload concurrently and independently.
//!
//! Overlapping reloads of one view are neither cancelled nor coalesced:
//! they queue on the view lock and each one loads whatever source the
//! model holds when it gets there.

use super::report::{ReloadReport, ViewOutcome};
use super::view::{ViewPhase, ViewSlot, WidgetView};
use crate::fetch::HttpFetcher;
use crate::module::ScriptModuleLoader;
use crate::style::StyleLoader;
use futures::future::join_all;
use hotwidget_kernel::bus::{EventKind, Listener, ListenerOwner, SubscriptionId, ViewId};
use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_kernel::context::ContextBridge;
use hotwidget_kernel::document::Document;
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use hotwidget_kernel::event::WidgetEvent;
use hotwidget_kernel::model::{CSS_ATTRIBUTE, ESM_ATTRIBUTE, WidgetModel};
use hotwidget_kernel::module::ModuleLoader;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Tag of a view's root element
pub const ROOT_TAG: &str = "div";

/// Render and hot-reload controller for one model
pub struct WidgetController {
    model: Arc<WidgetModel>,
    loader: Arc<dyn ModuleLoader>,
    styles: Arc<StyleLoader>,
    views: RwLock<Vec<Arc<WidgetView>>>,
    events: broadcast::Sender<WidgetEvent>,
    hot_reload: Mutex<Vec<SubscriptionId>>,
}

impl WidgetController {
    pub fn new(
        model: Arc<WidgetModel>,
        loader: Arc<dyn ModuleLoader>,
        styles: Arc<StyleLoader>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            model,
            loader,
            styles,
            views: RwLock::new(Vec::new()),
            events,
            hot_reload: Mutex::new(Vec::new()),
        })
    }

    /// Controller with the Rhai loader and HTTP stylesheets
    pub fn from_config(
        model: Arc<WidgetModel>,
        document: Arc<Document>,
        config: &HotwidgetConfig,
    ) -> WidgetResult<Arc<Self>> {
        let fetcher = HttpFetcher::new(&config.http)?;
        let loader = ScriptModuleLoader::with_fetcher(config, fetcher.clone());
        let styles = StyleLoader::new(document, Arc::new(fetcher));
        Ok(Self::new(model, Arc::new(loader), Arc::new(styles)))
    }

    pub fn model(&self) -> &Arc<WidgetModel> {
        &self.model
    }

    pub fn styles(&self) -> &Arc<StyleLoader> {
        &self.styles
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WidgetEvent) {
        let _ = self.events.send(event);
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Register a new, unrendered view
    pub fn create_view(&self) -> Arc<WidgetView> {
        let view = Arc::new(WidgetView::new(ROOT_TAG));
        self.views.write().push(view.clone());
        debug!(model_id = %self.model.id(), view_id = %view.id(), "view created");
        view
    }

    /// Live views, in creation order
    pub fn views(&self) -> Vec<Arc<WidgetView>> {
        self.views.read().clone()
    }

    pub fn view(&self, id: ViewId) -> Option<Arc<WidgetView>> {
        self.views.read().iter().find(|v| v.id() == id).cloned()
    }

    /// Create a view and render it
    pub async fn render_new_view(&self) -> WidgetResult<Arc<WidgetView>> {
        let view = self.create_view();
        self.render(&view).await?;
        Ok(view)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Initial render: apply the stylesheet, then load and invoke the module
    ///
    /// A stylesheet failure is reported as [`WidgetEvent::StyleFailed`] and
    /// does not stop the module from rendering.
    pub async fn render(&self, view: &Arc<WidgetView>) -> WidgetResult<()> {
        let mut slot = view.lock().await;
        view.guard_transition(view.phase() == ViewPhase::Unrendered, ViewPhase::Rendered)?;

        let _ = self.reload_style().await;
        self.mount(view, &mut slot).await
    }

    /// Reload one view with the model's current module
    ///
    /// Unrendered views are skipped. The previous cleanup runs first; if it
    /// fails the failure is logged and the reload carries on.
    pub async fn reload_view(&self, view: &Arc<WidgetView>) -> WidgetResult<ViewOutcome> {
        let mut slot = view.lock().await;
        if view.phase() == ViewPhase::Unrendered {
            debug!(view_id = %view.id(), "reload skipped: view not rendered yet");
            return Ok(ViewOutcome::Skipped);
        }
        view.guard_transition(view.phase().can_reload(), ViewPhase::Reloading)?;
        view.set_phase(ViewPhase::Reloading);

        self.run_cleanup(view, &mut slot).await;
        let removed = self.model.off(None, ListenerOwner::View(view.id()));
        view.el().clear();
        debug!(view_id = %view.id(), listeners_removed = removed, "view torn down");

        self.mount(view, &mut slot).await?;
        Ok(ViewOutcome::Reloaded)
    }

    /// Reload every live view with the model's current module
    pub async fn reload_module(&self) -> ReloadReport {
        let views = self.views();
        let model_id = self.model.id().to_string();
        info!(model_id = %model_id, views = views.len(), "Reloading module");
        self.emit(WidgetEvent::ReloadStarted {
            model_id: model_id.clone(),
            views: views.len(),
        });

        let started = Instant::now();
        let outcomes = join_all(views.iter().map(|view| async move {
            let outcome = match self.reload_view(view).await {
                Ok(outcome) => outcome,
                Err(WidgetError::ViewDisposed(_)) => ViewOutcome::Skipped,
                Err(e) => ViewOutcome::Failed(e),
            };
            (view.id(), outcome)
        }))
        .await;

        let report = ReloadReport {
            model_id,
            views: outcomes,
            duration: started.elapsed(),
        };
        info!(
            model_id = %report.model_id,
            reloaded = report.reloaded(),
            failed = report.failed(),
            skipped = report.skipped(),
            duration_ms = report.duration.as_millis() as u64,
            "Module reload finished"
        );
        self.emit(WidgetEvent::ReloadCompleted {
            model_id: report.model_id.clone(),
            reloaded: report.reloaded(),
            failed: report.failed(),
            duration: report.duration,
        });
        report
    }

    /// Re-apply the model's stylesheet; views are not touched
    pub async fn reload_style(&self) -> WidgetResult<()> {
        let source = self.model.style_source();
        let stable_id = self.model.stable_id();
        let model_id = self.model.id().to_string();

        match self
            .styles
            .apply_style(source.as_ref(), stable_id.as_ref())
            .await
        {
            Ok(()) => {
                if let (Some(_), Some(stable_id)) = (source, stable_id) {
                    self.emit(WidgetEvent::StyleApplied {
                        model_id,
                        stable_id: stable_id.to_string(),
                    });
                }
                Ok(())
            }
            Err(e) => {
                self.emit(WidgetEvent::StyleFailed {
                    model_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Tear a view down for good
    ///
    /// Runs the current cleanup at most once, drops the view's listeners and
    /// unregisters it. Never fails: cleanup errors are only logged.
    pub async fn dispose(&self, view: &Arc<WidgetView>) {
        let mut slot = view.lock().await;
        if view.phase().is_disposed() {
            return;
        }

        self.run_cleanup(view, &mut slot).await;
        self.model.off(None, ListenerOwner::View(view.id()));
        self.views.write().retain(|v| v.id() != view.id());
        view.set_phase(ViewPhase::Disposed);

        info!(model_id = %self.model.id(), view_id = %view.id(), "view disposed");
        self.emit(WidgetEvent::ViewDisposed {
            model_id: self.model.id().to_string(),
            view_id: view.id(),
        });
    }

    /// Stop hot reload and dispose every view
    pub async fn shutdown(&self) {
        self.uninstall_hot_reload();
        let views = self.views();
        join_all(views.iter().map(|view| self.dispose(view))).await;
    }

    /// Load the current module and invoke it; the view lock is held
    async fn mount(&self, view: &WidgetView, slot: &mut ViewSlot) -> WidgetResult<()> {
        match self.load_and_invoke(view, slot).await {
            Ok(()) => {
                let generation = view.bump_generation();
                view.set_phase(ViewPhase::Rendered);
                info!(model_id = %self.model.id(), view_id = %view.id(), generation, "view rendered");
                self.emit(WidgetEvent::RenderCompleted {
                    model_id: self.model.id().to_string(),
                    view_id: view.id(),
                    generation,
                });
                Ok(())
            }
            Err(e) => {
                view.set_phase(ViewPhase::Failed);
                error!(model_id = %self.model.id(), view_id = %view.id(), error = %e, "render failed");
                self.emit(WidgetEvent::RenderFailed {
                    model_id: self.model.id().to_string(),
                    view_id: view.id(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn load_and_invoke(&self, view: &WidgetView, slot: &mut ViewSlot) -> WidgetResult<()> {
        let source = self
            .model
            .module_source()
            .ok_or_else(|| WidgetError::MissingSource(ESM_ATTRIBUTE.to_string()))?;
        let module = self.loader.load(&source).await?;

        let ctx = ContextBridge::build(&self.model, view.id(), view.el());
        debug!(view_id = %view.id(), module = module.name(), "invoking entry point");
        slot.cleanup = module.render(ctx).await?;
        Ok(())
    }

    /// Run and discard the current cleanup
    async fn run_cleanup(&self, view: &WidgetView, slot: &mut ViewSlot) {
        let cleanup = slot.take_cleanup();
        if cleanup.is_noop() {
            return;
        }
        if let Err(e) = cleanup.invoke().await {
            warn!(view_id = %view.id(), error = %e, "cleanup failed; continuing");
            self.emit(WidgetEvent::CleanupFailed {
                model_id: self.model.id().to_string(),
                view_id: view.id(),
                error: e.to_string(),
            });
        }
    }

    // ------------------------------------------------------------------------
    // Hot reload
    // ------------------------------------------------------------------------

    /// Reload on `change:_esm` and `change:_css`
    ///
    /// The listeners belong to the model, not to a view, and hold only a
    /// weak reference to the controller. Changes are ignored while the
    /// model has no stable id. Installing twice is a no-op.
    pub fn install_hot_reload(self: &Arc<Self>) {
        let mut subscriptions = self.hot_reload.lock();
        if !subscriptions.is_empty() {
            return;
        }

        let esm = self.change_listener(ESM_ATTRIBUTE, |controller| async move {
            let report = controller.reload_module().await;
            for (view_id, e) in report.errors() {
                error!(%view_id, error = %e, "hot module reload failed");
            }
        });
        let css = self.change_listener(CSS_ATTRIBUTE, |controller| async move {
            if let Err(e) = controller.reload_style().await {
                error!(error = %e, "hot style reload failed");
            }
        });

        subscriptions.push(self.model.on(
            EventKind::change(ESM_ATTRIBUTE),
            ListenerOwner::Model,
            esm,
        ));
        subscriptions.push(self.model.on(
            EventKind::change(CSS_ATTRIBUTE),
            ListenerOwner::Model,
            css,
        ));
        info!(model_id = %self.model.id(), "hot reload installed");
    }

    /// Remove the hot-reload listeners
    pub fn uninstall_hot_reload(&self) {
        let subscriptions = std::mem::take(&mut *self.hot_reload.lock());
        if subscriptions.is_empty() {
            return;
        }
        for id in subscriptions {
            self.model.off_subscription(id);
        }
        debug!(model_id = %self.model.id(), "hot reload uninstalled");
    }

    pub fn is_hot_reload_installed(&self) -> bool {
        !self.hot_reload.lock().is_empty()
    }

    fn change_listener<F, Fut>(self: &Arc<Self>, attribute: &'static str, task: F) -> Listener
    where
        F: Fn(Arc<Self>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |_: &serde_json::Value| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            if controller.model.stable_id().is_none() {
                debug!(attribute, "no stable id; hot update ignored");
                return;
            }
            match Handle::try_current() {
                Ok(handle) => {
                    debug!(attribute, "source changed; scheduling reload");
                    handle.spawn(task(controller));
                }
                Err(_) => warn!(attribute, "source changed outside a tokio runtime; ignored"),
            }
        })
    }
}

impl Drop for WidgetController {
    fn drop(&mut self) {
        self.uninstall_hot_reload();
    }
}
