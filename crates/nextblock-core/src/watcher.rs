//! Poll loop.
//!
//! Each cycle reads the session record once, sends a heartbeat built from
//! that snapshot and shows any notices the tracker decides are due. The
//! watcher never writes the record. Sink failures are logged and the loop
//! keeps going.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::events::Notice;
use crate::heartbeat::Heartbeat;
use crate::sinks::{HeartbeatSink, Notifier};
use crate::storage::SessionStore;
use crate::tracker::NotificationTracker;

/// What one cycle did. Mostly useful to tests and debug logging.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub session_present: bool,
    pub notices: Vec<Notice>,
    pub heartbeat_sent: bool,
}

pub struct Watcher<S, H, N> {
    store: S,
    sink: H,
    notifier: N,
    tracker: NotificationTracker,
    poll_interval: Duration,
    time_scale: f64,
    cycles: u64,
}

impl<S, H, N> Watcher<S, H, N>
where
    S: SessionStore,
    H: HeartbeatSink,
    N: Notifier,
{
    pub fn new(
        store: S,
        sink: H,
        notifier: N,
        tracker: NotificationTracker,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            sink,
            notifier,
            tracker,
            poll_interval,
            time_scale: 1.0,
            cycles: 0,
        }
    }

    /// Speed up elapsed time for notice evaluation. Heartbeats keep
    /// reporting real time.
    pub fn with_time_scale(mut self, factor: f64) -> Self {
        self.time_scale = factor;
        self
    }

    // ── Queries ──

    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn tracker(&self) -> &NotificationTracker {
        &self.tracker
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Loop ──

    pub async fn cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.cycles += 1;
        let session = self.store.load();

        let notices = self
            .tracker
            .evaluate(session.as_ref(), now, self.time_scale);
        for notice in &notices {
            tracing::info!(block = notice.block(), message = %notice.message(), "notice");
            if let Err(e) = self.notifier.notify(notice.title(), &notice.message()).await {
                tracing::warn!(error = %e, "failed to show notification");
            }
        }

        let beat = Heartbeat::from_session(session.as_ref(), now);
        let heartbeat_sent = match self.sink.heartbeat(&beat).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to send heartbeat");
                false
            }
        };

        tracing::debug!(
            cycle = self.cycles,
            status = beat.session_status().unwrap_or_default(),
            notices = notices.len(),
            heartbeat_sent,
            "poll cycle done"
        );

        CycleReport {
            session_present: session.is_some(),
            notices,
            heartbeat_sent,
        }
    }

    /// Run cycles until `shutdown` resolves. Each sleep is shortened by the
    /// time the cycle itself took.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            time_scale = self.time_scale,
            "watcher started"
        );
        loop {
            let started = Instant::now();
            self.cycle(Utc::now()).await;
            let wait = self.poll_interval.saturating_sub(started.elapsed());
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        tracing::info!(cycles = self.cycles, "watcher stopped");
    }
}
