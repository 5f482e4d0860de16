//! Core error types for nextblock-core.
//!
//! One top-level [`CoreError`] for the interactive command path, plus the
//! narrower enums each boundary produces (plan files, sinks, config).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nextblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Plan file could not be turned into a session.
    #[error("Invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),

    /// Transition requested on a session that has already ended.
    #[error("Session '{session}' is not active")]
    NotActive { session: String },

    /// Command needs a persisted session and there is none.
    #[error("No active session found. Start a session first with 'start <plan_file>'")]
    NoActiveSession,

    /// `start` refused because a session record already exists.
    #[error("A session is already running ({path}). Use 'next' to advance or 'stop' to end it")]
    SessionExists { path: PathBuf },

    /// Persisted session record exists but cannot be decoded.
    #[error("Corrupt session state at {path}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing or replacing the session record failed.
    #[error("Failed to persist session state to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Telemetry or notification delivery failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plan-loading errors.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read plan file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML syntax error in plan: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Plan is missing the top-level 'name' field")]
    MissingName,

    #[error("Plan '{name}' has no valid blocks")]
    NoBlocks { name: String },
}

/// Delivery errors from the heartbeat and notification sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected request (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Desktop notification failed: {0}")]
    Notification(String),

    #[error("Notification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Timed out: {0}")]
    Timeout(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Could not determine a home directory")]
    NoHomeDir,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
