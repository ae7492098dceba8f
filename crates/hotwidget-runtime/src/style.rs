//! Style loader
//!
//! Keeps at most one style element per [`StableId`] in a [`Document`].
//! A replacement link is inserted next to the link it replaces and the old
//! element is only dropped once the new one has loaded, so there is no
//! window without styles. Inline text is replaced in place.
//!
//! No lock sequences concurrent applies for the same id: whichever settles
//! last wins.

use hotwidget_kernel::document::{Document, StyleElementId, StyleKind, StylesheetFetcher};
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use hotwidget_kernel::source::{StableId, StyleSource};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct StyleLoader {
    document: Arc<Document>,
    fetcher: Arc<dyn StylesheetFetcher>,
}

impl StyleLoader {
    pub fn new(document: Arc<Document>, fetcher: Arc<dyn StylesheetFetcher>) -> Self {
        Self { document, fetcher }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Apply a stylesheet for `id`
    ///
    /// A no-op when either the source or the id is absent.
    pub async fn apply_style(
        &self,
        source: Option<&StyleSource>,
        id: Option<&StableId>,
    ) -> WidgetResult<()> {
        let (Some(source), Some(id)) = (source, id) else {
            debug!(
                has_source = source.is_some(),
                has_id = id.is_some(),
                "style skipped"
            );
            return Ok(());
        };

        match source {
            StyleSource::Remote(href) => self.apply_link(href, id).await,
            StyleSource::Inline(text) => {
                self.apply_inline(text, id);
                Ok(())
            }
        }
    }

    async fn apply_link(&self, href: &str, id: &StableId) -> WidgetResult<()> {
        let link = match self.document.find_link(id) {
            Some(previous) => {
                debug!(stable_id = %id, href, "replacing stylesheet link");
                self.document
                    .insert_after(previous.element_id, id.clone(), StyleKind::pending_link(href))
            }
            None => self
                .document
                .append(id.clone(), StyleKind::pending_link(href)),
        };

        match self.fetcher.fetch(href).await {
            Ok(css) => {
                if !self.document.mark_loaded(link, css) {
                    debug!(stable_id = %id, href, "link removed before it loaded");
                    return Ok(());
                }
                let removed = self.document.retain_only(id, link);
                info!(stable_id = %id, href, removed, "stylesheet link loaded");
                Ok(())
            }
            Err(e) => {
                self.document.remove(link);
                error!(stable_id = %id, href, error = %e, "stylesheet link failed to load");
                Err(WidgetError::StyleLoad {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn apply_inline(&self, text: &str, id: &StableId) {
        let existing = self
            .document
            .find_inline(id)
            .map(|e| e.element_id)
            .filter(|&element_id| self.document.replace_text(element_id, text));

        let keep: StyleElementId = match existing {
            Some(element_id) => element_id,
            None => self.document.append(id.clone(), StyleKind::inline(text)),
        };

        let removed = self.document.retain_only(id, keep);
        debug!(stable_id = %id, removed, replaced = existing.is_some(), "inline style applied");
    }
}
