//! Configuration view and validation commands — `taskdeck config`.

use anyhow::Result;
use std::path::Path;

use taskdeck::config::{CONFIG_FILE_NAME, DeckConfig, DeckToml};

use super::super::ConfigCommands;

pub fn cmd_config(
    config: &DeckConfig,
    project_dir: &Path,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("taskdeck configuration");
            println!("======================");
            println!();

            match &config.config_path {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("No {} found, using defaults.", CONFIG_FILE_NAME),
            }
            println!();

            let toml = &config.toml;
            println!("[api]");
            println!("  base_url = \"{}\"", toml.api.base_url);
            println!(
                "  token = {}",
                if toml.api.token.is_some() { "(set)" } else { "(none)" }
            );
            println!();

            println!("[review]");
            println!("  tick_min_ms = {}", toml.review.tick_min_ms);
            println!("  tick_jitter_ms = {}", toml.review.tick_jitter_ms);
            println!("  max_step = {}", toml.review.max_step);
            println!("  ceiling = {}", toml.review.ceiling);
            println!("  settle_ms = {}", toml.review.settle_ms);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  api_base = \"{}\"", config.api_base());
            println!(
                "  token = {}",
                if config.token().is_some() { "(set)" } else { "(none)" }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if config.config_path.is_none() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
                return Ok(());
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let config_path = project_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DeckToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url, token");
            println!("  - [review] tick_min_ms, tick_jitter_ms, max_step, ceiling, settle_ms");
            println!();
        }
    }

    Ok(())
}
