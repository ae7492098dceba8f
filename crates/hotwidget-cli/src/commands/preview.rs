//! `hotwidget preview` command implementation

use super::SourceArg;
use colored::Colorize;
use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_kernel::document::{Document, StyleKind};
use hotwidget_kernel::event::WidgetEvent;
use hotwidget_kernel::manager::WidgetManager;
use hotwidget_kernel::model::{CSS_ATTRIBUTE, ESM_ATTRIBUTE, ID_ATTRIBUTE, WidgetModel};
use hotwidget_kernel::source::StableId;
use hotwidget_runtime::backend::MemoryBackend;
use hotwidget_runtime::lifecycle::{WidgetController, WidgetView};
use hotwidget_runtime::watcher::SourceWatcher;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub struct PreviewArgs {
    pub esm: String,
    pub css: Option<String>,
    pub id: Option<String>,
    pub watch: bool,
}

/// Render one headless view, optionally reloading it on file changes
pub async fn run(config: &HotwidgetConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let esm = SourceArg::resolve(&args.esm)?;
    let css = args.css.as_deref().map(SourceArg::resolve).transpose()?;
    if args.id.is_none() && (css.is_some() || args.watch) {
        println!(
            "{}",
            "warning: no --id given; styles and hot reload are disabled".yellow()
        );
    }

    let manager = WidgetManager::new();
    let model = manager.create_model(Arc::new(MemoryBackend::new()));
    if let Some(id) = &args.id {
        model.set(ID_ATTRIBUTE, id)?;
    }

    let mut watcher = SourceWatcher::new(model.clone(), config.watch.clone());
    push_source(&model, &mut watcher, &esm, ESM_ATTRIBUTE).await?;
    if let Some(css) = &css {
        push_source(&model, &mut watcher, css, CSS_ATTRIBUTE).await?;
    }

    let document = Arc::new(Document::new());
    let controller = WidgetController::from_config(model.clone(), document.clone(), config)?;
    let view = controller.render_new_view().await?;
    print_view(&view, &document, model.stable_id().as_ref());

    if args.watch {
        let mut events = controller.subscribe();
        controller.install_hot_reload();
        watcher.start().await?;
        println!("{}", "Watching for changes, press Ctrl-C to stop".dimmed());

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(WidgetEvent::RenderCompleted { .. }) | Ok(WidgetEvent::StyleApplied { .. }) => {
                        print_view(&view, &document, model.stable_id().as_ref());
                    }
                    Ok(WidgetEvent::RenderFailed { error, .. }) => {
                        eprintln!("{} {}", "render failed:".red().bold(), error);
                    }
                    Ok(WidgetEvent::StyleFailed { error, .. }) => {
                        eprintln!("{} {}", "style failed:".red().bold(), error);
                    }
                    Ok(WidgetEvent::CleanupFailed { error, .. }) => {
                        eprintln!("{} {}", "cleanup failed:".yellow(), error);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped lifecycle events"),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        watcher.stop().await;
        info!("preview stopped");
    }

    controller.shutdown().await;
    Ok(())
}

async fn push_source(
    model: &WidgetModel,
    watcher: &mut SourceWatcher,
    source: &SourceArg,
    attribute: &str,
) -> anyhow::Result<()> {
    match source {
        SourceArg::File(path) => {
            let path = watcher.bind(path, attribute).await?;
            watcher.sync(&path).await?;
        }
        SourceArg::Url(url) => model.set(attribute, url)?,
    }
    Ok(())
}

fn print_view(view: &WidgetView, document: &Document, id: Option<&StableId>) {
    println!(
        "{} {} (generation {})",
        "view".bold(),
        view.id(),
        view.generation()
    );
    println!("{}", view.el().to_html());

    let Some(id) = id else {
        return;
    };
    for element in document.elements_for(id) {
        match &element.kind {
            StyleKind::Link { href, loaded, .. } => println!(
                "{} link {} ({})",
                "style".bold(),
                href,
                if *loaded { "loaded" } else { "pending" }
            ),
            StyleKind::Inline { text } => println!("{} inline {}", "style".bold(), text),
        }
    }
}
