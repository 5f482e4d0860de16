//! TOML-based application configuration.
//!
//! Stores:
//! - Watcher cadence and the testing time-scale factor
//! - Notification thresholds
//! - ActivityWatch server location
//!
//! Configuration is stored at `<config dir>/nextblock/config.toml`.
//! Every field has a default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::config_dir;
use crate::error::{ConfigError, Result};
use crate::tracker::{OvertimePolicy, ThresholdPolicy};

/// Poll loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_time")]
    pub poll_time: f64,
    /// Multiplies elapsed block time; only honoured in testing mode.
    #[serde(default = "default_time_scale")]
    pub time_scale_factor: f64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_5")]
    pub before_minutes: u32,
    #[serde(default = "default_5")]
    pub after_every_minutes: u32,
    #[serde(default)]
    pub overtime_policy: OvertimePolicy,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// ActivityWatch server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_testing_port")]
    pub testing_port: u16,
    /// Empty means: take it from the environment.
    #[serde(default)]
    pub hostname: String,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

// Default functions
fn default_poll_time() -> f64 {
    1.0
}
fn default_time_scale() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_5() -> u32 {
    5
}
fn default_app_name() -> String {
    "nextblock".into()
}
fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    5600
}
fn default_testing_port() -> u16 {
    5666
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_time: default_poll_time(),
            time_scale_factor: default_time_scale(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            before_minutes: 5,
            after_every_minutes: 5,
            overtime_policy: OvertimePolicy::Skip,
            app_name: default_app_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            testing_port: default_testing_port(),
            hostname: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self, testing: bool) -> String {
        let port = if testing { self.testing_port } else { self.port };
        format!("http://{}:{}", self.host, port)
    }

    pub fn resolved_hostname(&self) -> String {
        if !self.hostname.is_empty() {
            return self.hostname.clone();
        }
        ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file in the default config directory.
    pub fn path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::Load {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_err = |message: String| ConfigError::Save {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_err(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Unknown keys and values of the
    /// wrong type are rejected and leave `self` unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn threshold_policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            enabled: self.notifications.enabled,
            before_minutes: self.notifications.before_minutes,
            after_every_minutes: self.notifications.after_every_minutes,
            overtime: self.notifications.overtime_policy,
        }
    }

    /// Poll interval; falls back to one second for non-positive values.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.watcher.poll_time)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(1))
    }

    /// Time-scale factor in effect. Always 1.0 outside testing mode.
    pub fn time_scale(&self, testing: bool) -> f64 {
        let factor = self.watcher.time_scale_factor;
        if testing && factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.notifications.before_minutes, 5);
        assert_eq!(parsed.server.port, 5600);
        assert_eq!(parsed.watcher.poll_time, 1.0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config =
            toml::from_str("[notifications]\nbefore_minutes = 2\novertime_policy = \"backfill\"\n")
                .unwrap();
        assert_eq!(parsed.notifications.before_minutes, 2);
        assert_eq!(parsed.notifications.after_every_minutes, 5);
        assert_eq!(parsed.notifications.overtime_policy, OvertimePolicy::Backfill);
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.server.host, "localhost");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("server.port").as_deref(), Some("5600"));
        assert_eq!(cfg.get("notifications.overtime_policy").as_deref(), Some("skip"));
        assert!(cfg.get("server.missing_key").is_none());
        assert!(cfg.get("server").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("notifications.before_minutes", "3").unwrap();
        cfg.set("notifications.enabled", "false").unwrap();
        cfg.set("watcher.poll_time", "0.5").unwrap();
        cfg.set("notifications.overtime_policy", "backfill").unwrap();
        assert_eq!(cfg.notifications.before_minutes, 3);
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.watcher.poll_time, 0.5);
        assert_eq!(cfg.notifications.overtime_policy, OvertimePolicy::Backfill);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("server.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("server", "x").is_err());
    }

    #[test]
    fn set_rejects_invalid_type_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.set("notifications.overtime_policy", "sometimes").is_err());
        assert!(cfg.set("server.port", "99999").is_err());
        assert!(cfg.notifications.enabled);
        assert_eq!(cfg.notifications.overtime_policy, OvertimePolicy::Skip);
        assert_eq!(cfg.server.port, 5600);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.notifications.after_every_minutes, 5);
    }

    #[test]
    fn load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[watcher\npoll_time = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("server.host", "aw.local").unwrap();
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.host, "aw.local");
    }

    #[test]
    fn poll_interval_and_time_scale_guards() {
        let mut cfg = Config::default();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        cfg.watcher.poll_time = -2.0;
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        cfg.watcher.poll_time = 0.25;
        assert_eq!(cfg.poll_interval(), Duration::from_millis(250));

        cfg.watcher.time_scale_factor = 60.0;
        assert_eq!(cfg.time_scale(false), 1.0);
        assert_eq!(cfg.time_scale(true), 60.0);
    }

    #[test]
    fn server_url_follows_testing_flag() {
        let cfg = ServerConfig {
            hostname: "box".into(),
            ..ServerConfig::default()
        };
        assert_eq!(cfg.base_url(false), "http://localhost:5600");
        assert_eq!(cfg.base_url(true), "http://localhost:5666");
        assert_eq!(cfg.resolved_hostname(), "box");
    }
}
