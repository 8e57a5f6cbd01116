//! Configuration command.

use std::path::Path;

use crate::config::{self, Config};

/// Print the effective configuration, optionally saving it
pub fn cmd_config(config: &Config, path: Option<&Path>, write: bool) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);

    if write {
        match path {
            Some(path) => config::save_to(config, path)?,
            None => config::save(config)?,
        }
        match path.map(Path::to_path_buf).or_else(config::config_path) {
            Some(saved) => eprintln!("Saved to {}", saved.display()),
            None => eprintln!("Saved."),
        }
    }
    Ok(())
}
