//! Views and their lifecycle slot

use hotwidget_kernel::bus::ViewId;
use hotwidget_kernel::element::Element;
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use hotwidget_kernel::module::CleanupHandle;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard, watch};

/// Lifecycle phase of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPhase {
    /// Created, entry point not invoked yet
    Unrendered,
    /// Entry point completed; the slot holds its cleanup
    Rendered,
    /// Previous version torn down, next version loading
    Reloading,
    /// The last render or reload failed; the slot holds a no-op
    Failed,
    /// Torn down for good
    Disposed,
}

impl ViewPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewPhase::Unrendered => "unrendered",
            ViewPhase::Rendered => "rendered",
            ViewPhase::Reloading => "reloading",
            ViewPhase::Failed => "failed",
            ViewPhase::Disposed => "disposed",
        }
    }

    /// Whether a module reload may start from this phase
    ///
    /// `Reloading` is accepted so a reload whose future was dropped midway
    /// does not wedge the view.
    pub fn can_reload(&self) -> bool {
        matches!(
            self,
            ViewPhase::Rendered | ViewPhase::Failed | ViewPhase::Reloading
        )
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, ViewPhase::Disposed)
    }
}

impl fmt::Display for ViewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State guarded by the per-view lock
///
/// Holding the guard is what serializes transitions of one view.
#[derive(Debug, Default)]
pub(crate) struct ViewSlot {
    pub(crate) cleanup: CleanupHandle,
}

impl ViewSlot {
    /// Take the current cleanup, leaving a no-op in its place
    pub(crate) fn take_cleanup(&mut self) -> CleanupHandle {
        std::mem::take(&mut self.cleanup)
    }
}

/// One rendering surface bound to a model
pub struct WidgetView {
    id: ViewId,
    el: Element,
    slot: Mutex<ViewSlot>,
    phase: watch::Sender<ViewPhase>,
    generation: AtomicU64,
}

impl WidgetView {
    pub(crate) fn new(tag: &str) -> Self {
        let (phase, _) = watch::channel(ViewPhase::Unrendered);
        Self {
            id: ViewId::new(),
            el: Element::new(tag),
            slot: Mutex::new(ViewSlot::default()),
            phase,
            generation: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Root element of the view
    pub fn el(&self) -> &Element {
        &self.el
    }

    pub fn phase(&self) -> ViewPhase {
        *self.phase.borrow()
    }

    /// Watch phase changes
    pub fn watch_phase(&self) -> watch::Receiver<ViewPhase> {
        self.phase.subscribe()
    }

    /// Number of successful renders so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ViewSlot> {
        self.slot.lock().await
    }

    pub(crate) fn set_phase(&self, next: ViewPhase) {
        self.phase.send_replace(next);
    }

    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Check that the view may move to `to`
    pub(crate) fn guard_transition(&self, allowed: bool, to: ViewPhase) -> WidgetResult<()> {
        let from = self.phase();
        if from.is_disposed() {
            return Err(WidgetError::ViewDisposed(self.id.to_string()));
        }
        if !allowed {
            return Err(WidgetError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for WidgetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetView")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_allowed_phases() {
        assert!(!ViewPhase::Unrendered.can_reload());
        assert!(ViewPhase::Rendered.can_reload());
        assert!(ViewPhase::Failed.can_reload());
        assert!(!ViewPhase::Disposed.can_reload());
    }

    #[tokio::test]
    async fn test_phase_watch_sees_updates() {
        let view = WidgetView::new("div");
        let mut rx = view.watch_phase();
        assert_eq!(*rx.borrow(), ViewPhase::Unrendered);

        view.set_phase(ViewPhase::Rendered);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ViewPhase::Rendered);
    }

    #[test]
    fn test_disposed_view_rejects_transitions() {
        let view = WidgetView::new("div");
        view.set_phase(ViewPhase::Disposed);

        let err = view.guard_transition(true, ViewPhase::Rendered).unwrap_err();
        assert!(matches!(err, WidgetError::ViewDisposed(_)));
    }

    #[test]
    fn test_invalid_transition_names_phases() {
        let view = WidgetView::new("div");
        view.set_phase(ViewPhase::Rendered);

        match view.guard_transition(false, ViewPhase::Rendered).unwrap_err() {
            WidgetError::InvalidTransition { from, to } => {
                assert_eq!(from, "rendered");
                assert_eq!(to, "rendered");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
