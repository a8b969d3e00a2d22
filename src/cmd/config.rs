//! Configuration inspection — `gauge config`.

use std::path::Path;

use anyhow::{Context, Result};

use gauge::config::GaugeToml;

use super::super::ConfigCommands;

pub fn cmd_config(
    dir: &Path,
    config_file: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config = match config_file {
        Some(path) => GaugeToml::load(path)?,
        None => GaugeToml::load_or_default(dir)?,
    };

    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{}", rendered);
        }
        ConfigCommands::Validate => {
            let issues = config.validation_issues();
            if issues.is_empty() {
                println!("{}", console::style("Configuration is valid.").green());
            } else {
                println!(
                    "{} {} issue(s):",
                    console::style("Invalid configuration:").red().bold(),
                    issues.len()
                );
                for issue in &issues {
                    println!("  - {}", issue);
                }
                anyhow::bail!("Configuration validation failed");
            }
        }
    }
    Ok(())
}
