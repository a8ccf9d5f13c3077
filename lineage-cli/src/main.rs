//! Lineage CLI: build and export provenance documents from the shell.

mod commands;

use anyhow::Context;
use clap::Parser;
use lineage::config::LineageConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Provenance documents for pipeline outputs
#[derive(Parser, Debug)]
#[command(name = "lineage", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Subcommand
    #[command(subcommand)]
    command: commands::Command,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LineageConfig> {
    let config = match path {
        Some(path) => LineageConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => LineageConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = load_config(cli.config.as_ref())?;
    commands::handle_command(cli.command, config)
}
