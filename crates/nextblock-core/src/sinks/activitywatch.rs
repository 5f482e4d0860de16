//! ActivityWatch heartbeat sink -- posts session state to a local aw-server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;

use crate::error::SinkError;
use crate::heartbeat::Heartbeat;
use crate::sinks::traits::HeartbeatSink;
use crate::storage::ServerConfig;

pub const CLIENT_NAME: &str = "nextblock";
const EVENT_TYPE: &str = "nextblock-session";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ActivityWatchClient {
    client: Client,
    base_url: String,
    hostname: String,
    bucket_id: String,
    /// Seconds within which consecutive identical heartbeats are merged.
    pulsetime: f64,
    bucket_ready: AtomicBool,
}

impl ActivityWatchClient {
    pub fn new(
        base_url: impl Into<String>,
        hostname: impl Into<String>,
        pulsetime: f64,
    ) -> Result<Self, SinkError> {
        let hostname = hostname.into();
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket_id: format!("{CLIENT_NAME}_{hostname}"),
            hostname,
            pulsetime,
            bucket_ready: AtomicBool::new(false),
        })
    }

    /// Client for the configured server. Pulsetime is one poll interval
    /// plus a second of slack.
    pub fn from_config(
        server: &ServerConfig,
        testing: bool,
        poll_interval: Duration,
    ) -> Result<Self, SinkError> {
        Self::new(
            server.base_url(testing),
            server.resolved_hostname(),
            poll_interval.as_secs_f64() + 1.0,
        )
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    /// Create the bucket if this client has not done so yet.
    /// An already existing bucket counts as success.
    pub async fn ensure_bucket(&self) -> Result<(), SinkError> {
        if self.bucket_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        let url = format!("{}/api/0/buckets/{}", self.base_url, self.bucket_id);
        let body = json!({
            "client": CLIENT_NAME,
            "type": EVENT_TYPE,
            "hostname": self.hostname,
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        check(resp).await?;
        self.bucket_ready.store(true, Ordering::Release);
        tracing::info!(bucket = %self.bucket_id, "activitywatch bucket ready");
        Ok(())
    }
}

#[async_trait]
impl HeartbeatSink for ActivityWatchClient {
    async fn heartbeat(&self, beat: &Heartbeat) -> Result<(), SinkError> {
        self.ensure_bucket().await?;
        let url = format!(
            "{}/api/0/buckets/{}/heartbeat",
            self.base_url, self.bucket_id
        );
        let event = json!({
            "timestamp": beat.timestamp,
            "duration": 0,
            "data": beat.data,
        });
        let resp = self
            .client
            .post(&url)
            .query(&[("pulsetime", self.pulsetime)])
            .json(&event)
            .send()
            .await?;
        check(resp).await
    }
}

async fn check(resp: Response) -> Result<(), SinkError> {
    let status = resp.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SinkError::Status {
        status: status.as_u16(),
        body,
    })
}
