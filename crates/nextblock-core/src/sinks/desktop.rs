//! Desktop notifications through the platform notification service.

use std::time::Duration;

use async_trait::async_trait;
use notify_rust::Notification;

use crate::error::SinkError;
use crate::sinks::traits::Notifier;

const SHOW_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Blocking call into the notification service.
    pub fn show(&self, title: &str, message: &str) -> Result<(), SinkError> {
        Notification::new()
            .summary(title)
            .body(message)
            .appname(&self.app_name)
            .show()
            .map(|_| ())
            .map_err(|e| SinkError::Notification(e.to_string()))
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        let this = self.clone();
        let (title, message) = (title.to_string(), message.to_string());
        let task = tokio::task::spawn_blocking(move || this.show(&title, &message));
        match tokio::time::timeout(SHOW_TIMEOUT, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(SinkError::Timeout(format!(
                "desktop notification after {}s",
                SHOW_TIMEOUT.as_secs()
            ))),
        }
    }
}
