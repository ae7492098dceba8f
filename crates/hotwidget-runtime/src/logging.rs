//! Logging setup

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info,hotwidget_runtime=info,hotwidget_kernel=warn"
    }
}

/// Install a fmt subscriber
///
/// `RUST_LOG` takes precedence over `verbose`. Safe to call more than
/// once; later calls leave the first subscriber in place.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(false);
        init_logging(true);
        tracing::info!("still logging");
    }

    #[test]
    fn test_verbose_directives() {
        assert_eq!(default_directives(true), "debug");
        assert!(default_directives(false).starts_with("info"));
    }
}
