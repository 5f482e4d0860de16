//! Outbound side effects of the watcher: heartbeats and notifications.

pub mod activitywatch;
pub mod desktop;
pub mod traits;

pub use activitywatch::ActivityWatchClient;
pub use desktop::DesktopNotifier;
pub use traits::{HeartbeatSink, Notifier};
