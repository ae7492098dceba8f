//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hotwidget - preview widget modules with live reload
#[derive(Parser)]
#[command(name = "hotwidget")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (toml, yaml or json)
    #[arg(short = 'c', long, global = true, env = "HOTWIDGET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Render a widget headlessly and print its root element
    Preview {
        /// Module source: a .rhai file or an http(s) URL
        #[arg(long)]
        esm: String,

        /// Stylesheet source: a .css file or an http(s) URL
        #[arg(long)]
        css: Option<String>,

        /// Stable widget id; styles and hot reload need one
        #[arg(long)]
        id: Option<String>,

        /// Keep running and reload when source files change
        #[arg(short, long)]
        watch: bool,
    },

    /// Load a module and check that it defines its entry point
    Check {
        /// Module source: a .rhai file or an http(s) URL
        esm: String,
    },
}
