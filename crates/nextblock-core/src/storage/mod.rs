mod config;
mod store;

pub use config::{Config, NotificationsConfig, ServerConfig, WatcherConfig};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, STATE_FILE_NAME};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Overrides both directories below; tests point it at a temp dir.
pub const HOME_ENV: &str = "NEXTBLOCK_HOME";

/// Returns `$NEXTBLOCK_HOME/config` or the platform config dir + `nextblock/`.
///
/// # Errors
/// Returns an error if no base directory can be determined or if
/// creating the directory fails.
pub fn config_dir() -> Result<PathBuf> {
    resolve_dir("config", dirs::config_dir)
}

/// Returns `$NEXTBLOCK_HOME/data` or the platform data dir + `nextblock/`.
/// The session record lives here.
pub fn state_dir() -> Result<PathBuf> {
    resolve_dir("data", dirs::data_dir)
}

fn resolve_dir(sub: &str, platform: fn() -> Option<PathBuf>) -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(sub),
        _ => match platform() {
            Some(base) => base.join("nextblock"),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".nextblock")
                .join(sub),
        },
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
