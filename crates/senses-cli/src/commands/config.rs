//! Config command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::util::write_output;

pub fn cmd_config(action: ConfigAction, config: &Config, output: Option<&PathBuf>) -> Result<()> {
    match action {
        ConfigAction::Path => write_output(output, &format!("{}\n", Config::path().display())),
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            write_output(output, &content)
        }
        ConfigAction::Init => {
            let path = Config::path();
            if path.exists() {
                eprintln!("Config already exists at {}", path.display());
                return Ok(());
            }
            Config::default().save()?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
    }
}
