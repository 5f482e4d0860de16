//! `nextblock config`: read and edit `config.toml` by dotted key.

use clap::Subcommand;
use nextblock_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, e.g. `watcher.poll_time`
    Get {
        /// Dotted key: `<section>.<field>` in watcher, notifications or server
        key: String,
    },
    /// Change one value and write the file
    Set {
        /// Dotted key
        key: String,
        /// Parsed as the field's existing type
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Overwrite config.toml with the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            tracing::debug!(%key, %value, "config updated");
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            let path = Config::path()?;
            Config::default().save_to(&path)?;
            println!("Reset {} to defaults", path.display());
        }
    }
    Ok(())
}
