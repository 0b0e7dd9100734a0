use anyhow::{Context, Result};
use blobagotchi::{app, config};
use clap::Parser;
use std::{fs::OpenOptions, sync::Mutex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = config::Cli::parse();
    let paths = config::project_paths(cli.data_dir.as_deref())?;

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    // stdout and stderr belong to the terminal UI
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
        .with_context(|| format!("opening {}", paths.log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    app::run(cli, paths).await
}
