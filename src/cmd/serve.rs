//! API server commands: `taskboard serve` and `taskboard init`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use taskboard::config::TaskboardConfig;
use taskboard::server::ai::AiBridge;
use taskboard::server::db::TaskboardDb;

pub async fn cmd_serve(
    config: TaskboardConfig,
    port: Option<u16>,
    db_path: Option<PathBuf>,
    dev: bool,
) -> Result<()> {
    let mut settings = config.server;
    if let Some(port) = port {
        settings.port = port;
    }
    if let Some(path) = db_path {
        settings.db_path = path;
    }
    settings.dev_mode |= dev;

    let ai = AiBridge::from_settings(&config.ai);
    taskboard::server::start_server(&settings, ai).await
}

pub fn cmd_init(config: &TaskboardConfig, db_path: Option<PathBuf>) -> Result<()> {
    let db_path = db_path.unwrap_or_else(|| config.server.db_path.clone());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    TaskboardDb::new(&db_path)?;
    println!("Taskboard database initialized at {}", db_path.display());
    Ok(())
}
