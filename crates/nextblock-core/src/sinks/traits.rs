use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::heartbeat::Heartbeat;

/// Receives one heartbeat per poll cycle. Failures are reported to the
/// caller, which logs and carries on.
#[async_trait]
pub trait HeartbeatSink: Send + Sync {
    async fn heartbeat(&self, beat: &Heartbeat) -> Result<(), SinkError>;
}

/// Shows a user-facing notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: HeartbeatSink + ?Sized> HeartbeatSink for Arc<T> {
    async fn heartbeat(&self, beat: &Heartbeat) -> Result<(), SinkError> {
        (**self).heartbeat(beat).await
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        (**self).notify(title, message).await
    }
}
