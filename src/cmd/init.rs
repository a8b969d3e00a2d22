//! Project initialization — `gauge init`.

use std::path::Path;

use anyhow::Result;

use gauge::config::{CONFIG_FILE_NAME, GaugeToml};

pub fn cmd_init(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    std::fs::write(&path, GaugeToml::default_file_contents())?;
    println!(
        "Initialized gauge configuration at {}",
        console::style(path.display()).green()
    );
    Ok(())
}
