//! Configuration view and setup commands: `taskboard config`.

use std::path::Path;

use anyhow::{Context, Result};
use taskboard::config::{CONFIG_FILE_NAME, TaskboardConfig};

use super::super::ConfigCommands;

pub fn cmd_config(
    project_dir: &Path,
    config: &TaskboardConfig,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskboard Configuration");
            println!("=======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found; showing defaults.", CONFIG_FILE_NAME);
            }
            println!("Effective values (with environment overrides):");
            println!();

            let mut shown = config.clone();
            if shown.ai.api_key.is_some() {
                shown.ai.api_key = Some("********".to_string());
            }
            let text = toml::to_string_pretty(&shown).context("Failed to render configuration")?;
            println!("{}", text);
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }
            TaskboardConfig::default().save(&config_path)?;
            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
        }
    }

    Ok(())
}
