//! hotwidget CLI - headless widget preview with live reload

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_runtime::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => HotwidgetConfig::load(path)?,
        None => HotwidgetConfig::default(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command_async(cli.command, config))
}

async fn run_command_async(command: Commands, config: HotwidgetConfig) -> anyhow::Result<()> {
    match command {
        Commands::Preview {
            esm,
            css,
            id,
            watch,
        } => {
            commands::preview::run(
                &config,
                commands::preview::PreviewArgs {
                    esm,
                    css,
                    id,
                    watch,
                },
            )
            .await?;
        }

        Commands::Check { esm } => {
            commands::check::run(&config, &esm).await?;
        }
    }

    Ok(())
}
