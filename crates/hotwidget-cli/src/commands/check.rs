//! `hotwidget check` command implementation

use super::SourceArg;
use anyhow::Context;
use colored::Colorize;
use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_kernel::module::ModuleLoader;
use hotwidget_kernel::source::Source;
use hotwidget_runtime::module::ScriptModuleLoader;

/// Load a module without rendering it
pub async fn run(config: &HotwidgetConfig, esm: &str) -> anyhow::Result<()> {
    let source = match SourceArg::resolve(esm)? {
        SourceArg::File(path) => Source::Inline(
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        SourceArg::Url(url) => Source::Remote(url),
    };

    let loader = ScriptModuleLoader::new(config)?;
    loader
        .load(&source)
        .await
        .with_context(|| format!("{} failed to load", esm))?;

    println!(
        "{} {} defines `{}`",
        "ok".green().bold(),
        esm,
        config.script.entry_point
    );
    Ok(())
}
