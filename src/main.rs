use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod controller;
mod draft;
mod mail;
mod render;
mod ui;

use config::Config;

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_file()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env("MAILVIEW_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, created, config_path) = Config::load_or_create()?;
    init_logging(&config)?;

    app::run(config, created, &config_path).await
}
