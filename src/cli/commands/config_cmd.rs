//! Configuration management commands.

use console::style;

use crate::cli::icons::Icon;
use crate::config::{Config, Settings};

/// Print the effective settings.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let rows = settings.describe();
    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    for (key, value) in rows {
        println!("{:width$}  {}", style(key).cyan(), value, width = width);
    }
    Ok(())
}

/// Print the config file in use, if any.
pub fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{}", path.display()),
        None => {
            eprintln!("{} No config file found; using defaults", Icon::Caution);
            eprintln!(
                "  {} Looked for docintake.toml, docintake.yaml and docintake.json",
                Icon::Detail
            );
        }
    }
    Ok(())
}
