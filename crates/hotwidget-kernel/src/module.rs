//! Loaded module contract
//!
//! A module exposes one entry point taking a [`RenderContext`] and
//! returning a [`CleanupHandle`], which is a no-op when the module returns
//! nothing.

use crate::context::RenderContext;
use crate::error::WidgetResult;
use crate::source::ModuleSource;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, WidgetResult<()>> + Send>;

/// Deferred action releasing what a module's entry point set up
///
/// Invoking the handle consumes it, so a cleanup runs at most once.
#[derive(Default)]
pub struct CleanupHandle {
    action: Option<CleanupFn>,
}

impl CleanupHandle {
    /// A cleanup that does nothing
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Wrap an asynchronous cleanup
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = WidgetResult<()>> + Send + 'static,
    {
        Self {
            action: Some(Box::new(move || Box::pin(f()))),
        }
    }

    /// Wrap a synchronous cleanup
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> WidgetResult<()> + Send + 'static,
    {
        Self::new(move || async move { f() })
    }

    pub fn is_noop(&self) -> bool {
        self.action.is_none()
    }

    /// Run the cleanup to completion
    pub async fn invoke(self) -> WidgetResult<()> {
        match self.action {
            Some(action) => action().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CleanupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupHandle")
            .field("noop", &self.is_noop())
            .finish()
    }
}

/// The executable form of a module source
#[async_trait::async_trait]
pub trait WidgetModule: Send + Sync {
    /// Human-readable origin, used in logs
    fn name(&self) -> &str {
        "module"
    }

    /// Invoke the entry point
    async fn render(&self, ctx: RenderContext) -> WidgetResult<CleanupHandle>;
}

/// Turns module sources into loaded modules
#[async_trait::async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, source: &ModuleSource) -> WidgetResult<Arc<dyn WidgetModule>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WidgetError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_noop_cleanup() {
        let handle = CleanupHandle::default();
        assert!(handle.is_noop());
        assert!(handle.invoke().await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let handle = CleanupHandle::from_fn(move || {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(!handle.is_noop());
        handle.invoke().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_cleanup_error_surfaces() {
        let handle = CleanupHandle::new(|| async {
            tokio::task::yield_now().await;
            Err(WidgetError::Cleanup("boom".to_string()))
        });

        let err = handle.invoke().await.unwrap_err();
        assert!(matches!(err, WidgetError::Cleanup(_)));
    }
}
