//! Config command.

use anyhow::Context;
use std::path::Path;

use crate::config::{self, Config};

/// Show the effective configuration, its location, or write the defaults
pub fn cmd_config(explicit: Option<&Path>, path_only: bool, init: bool) -> anyhow::Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_path().context("Could not determine config directory")?,
    };

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    if init {
        if path.exists() {
            println!("Config file already exists: {:?}", path);
            return Ok(());
        }
        let written = match explicit {
            Some(_) => {
                config::save_to(&Config::default(), &path)?;
                path
            }
            None => config::save(&Config::default())?,
        };
        println!("Wrote default config to {:?}", written);
        return Ok(());
    }

    let effective = if path.exists() {
        config::load_from(&path)?
    } else {
        println!("# No config file at {:?}, showing defaults\n", path);
        Config::default()
    };
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
