use hotwidget_kernel::bus::ViewId;
use hotwidget_kernel::error::WidgetError;
use std::time::Duration;

/// What a module reload did to one view
#[derive(Debug)]
pub enum ViewOutcome {
    /// Torn down and rendered with the new module
    Reloaded,
    /// Not rendered yet, or disposed while the reload was queued
    Skipped,
    /// The new module failed to load or render
    Failed(WidgetError),
}

/// Summary of a module reload fanned out to every live view
#[derive(Debug)]
pub struct ReloadReport {
    pub model_id: String,
    pub views: Vec<(ViewId, ViewOutcome)>,
    pub duration: Duration,
}

impl ReloadReport {
    pub fn reloaded(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Reloaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = (ViewId, &WidgetError)> {
        self.views.iter().filter_map(|(id, outcome)| match outcome {
            ViewOutcome::Failed(e) => Some((*id, e)),
            _ => None,
        })
    }

    /// The first view failure, if any
    pub fn first_error(&self) -> Option<&WidgetError> {
        self.errors().next().map(|(_, e)| e)
    }

    fn count(&self, pred: impl Fn(&ViewOutcome) -> bool) -> usize {
        self.views.iter().filter(|(_, o)| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<ViewOutcome>) -> ReloadReport {
        ReloadReport {
            model_id: "m".to_string(),
            views: outcomes.into_iter().map(|o| (ViewId::new(), o)).collect(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_counts() {
        let report = report(vec![
            ViewOutcome::Reloaded,
            ViewOutcome::Skipped,
            ViewOutcome::Failed(WidgetError::EntryPoint("boom".to_string())),
        ]);

        assert_eq!(report.reloaded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_first_error() {
        assert!(report(vec![ViewOutcome::Reloaded]).first_error().is_none());

        let report = report(vec![
            ViewOutcome::Reloaded,
            ViewOutcome::Failed(WidgetError::MissingSource("_esm".to_string())),
        ]);
        assert!(matches!(
            report.first_error(),
            Some(WidgetError::MissingSource(_))
        ));
    }
}
