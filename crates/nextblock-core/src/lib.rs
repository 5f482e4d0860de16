//! # Nextblock Core Library
//!
//! Core logic for nextblock, a tracker for sessions made of consecutive
//! time blocks. The `nextblock` CLI drives sessions through this crate and
//! runs the watcher that reports progress.
//!
//! ## Architecture
//!
//! - **Session**: a pure state machine. `start`, `advance` and `stop` take
//!   the current time explicitly and return a new [`Session`]
//! - **Storage**: one JSON session record replaced atomically, plus the
//!   TOML configuration
//! - **Tracker**: decides which threshold notices are due, each at most once
//!   per block run
//! - **Watcher**: poll loop that sends ActivityWatch heartbeats and desktop
//!   notifications without ever writing the session record
//!
//! ## Key Components
//!
//! - [`Plan`]: YAML session plan
//! - [`Session`]: persisted session state
//! - [`NotificationTracker`]: threshold de-duplication
//! - [`Watcher`]: the poll loop
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod heartbeat;
pub mod plan;
pub mod session;
pub mod sinks;
pub mod storage;
pub mod tracker;
pub mod watcher;

pub use error::{ConfigError, CoreError, PlanError, Result, SinkError};
pub use events::Notice;
pub use heartbeat::Heartbeat;
pub use plan::Plan;
pub use session::{Block, Session, SessionStatus};
pub use sinks::{ActivityWatchClient, DesktopNotifier, HeartbeatSink, Notifier};
pub use storage::{Config, FileSessionStore, MemorySessionStore, SessionStore};
pub use tracker::{NotificationTracker, OvertimePolicy, ThresholdPolicy};
pub use watcher::{CycleReport, Watcher};
