//! Session and block entities.
//!
//! A [`Session`] is a value snapshot: the only way to get a different one is
//! through the transition functions in [`super::engine`]. Fields are private
//! so the cursor/status invariants hold for every value in circulation,
//! including ones decoded from disk.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    /// Records written before `status` existed decode as inactive.
    #[default]
    Inactive,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Inactive => "inactive",
        }
    }
}

/// One planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    name: String,
    /// Minutes. Reference value only.
    planned_duration: u32,
    #[serde(rename = "start_dt", default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(rename = "end_dt", default)]
    end_time: Option<DateTime<Utc>>,
}

impl Block {
    pub fn new(name: impl Into<String>, planned_duration: u32) -> Self {
        Self {
            name: name.into(),
            planned_duration,
            start_time: None,
            end_time: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn planned_duration(&self) -> u32 {
        self.planned_duration
    }

    pub fn planned_seconds(&self) -> i64 {
        i64::from(self.planned_duration) * 60
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Time worked on this block: up to `end_time` once it has left the
    /// cursor, up to `now` while current, zero if never started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.start_time {
            Some(start) => clamp(self.end_time.unwrap_or(now) - start),
            None => Duration::zero(),
        }
    }

    /// Time worked beyond the planned duration.
    pub fn extended(&self, now: DateTime<Utc>) -> Duration {
        clamp(self.elapsed(now) - Duration::minutes(i64::from(self.planned_duration)))
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.start_time = Some(at);
    }

    pub(crate) fn mark_ended(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
    }
}

/// Tracked progress through a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSession")]
pub struct Session {
    name: String,
    current_block_idx: usize,
    status: SessionStatus,
    start_dt: Option<DateTime<Utc>>,
    end_dt: Option<DateTime<Utc>>,
    blocks: Vec<Block>,
}

impl Session {
    pub(crate) fn begin(name: String, blocks: Vec<Block>, now: DateTime<Utc>) -> Self {
        let mut session = Self {
            name,
            current_block_idx: 0,
            status: SessionStatus::Active,
            start_dt: Some(now),
            end_dt: None,
            blocks,
        };
        if let Some(first) = session.blocks.first_mut() {
            first.mark_started(now);
        }
        session
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn current_block_idx(&self) -> usize {
        self.current_block_idx
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn start_dt(&self) -> Option<DateTime<Utc>> {
        self.start_dt
    }

    pub fn end_dt(&self) -> Option<DateTime<Utc>> {
        self.end_dt
    }

    /// The block under the cursor, `None` once the cursor has run off the end.
    pub fn current_block(&self) -> Option<&Block> {
        self.blocks.get(self.current_block_idx)
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.start_dt {
            Some(start) => clamp(self.end_dt.unwrap_or(now) - start),
            None => Duration::zero(),
        }
    }

    // ── Mutators (engine only) ───────────────────────────────────────

    pub(crate) fn current_block_mut(&mut self) -> Option<&mut Block> {
        self.blocks.get_mut(self.current_block_idx)
    }

    pub(crate) fn set_cursor(&mut self, idx: usize) {
        self.current_block_idx = idx.min(self.blocks.len());
    }

    pub(crate) fn finish(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Inactive;
        self.end_dt = Some(now);
    }
}

/// Wire shape accepted on decode before invariants are checked.
#[derive(Deserialize)]
struct RawSession {
    name: String,
    current_block_idx: usize,
    #[serde(default)]
    status: SessionStatus,
    #[serde(default)]
    start_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    end_dt: Option<DateTime<Utc>>,
    blocks: Vec<Block>,
}

impl TryFrom<RawSession> for Session {
    type Error = String;

    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        if raw.current_block_idx > raw.blocks.len() {
            return Err(format!(
                "current_block_idx {} out of range for {} blocks",
                raw.current_block_idx,
                raw.blocks.len()
            ));
        }
        if raw.status == SessionStatus::Active && raw.current_block_idx == raw.blocks.len() {
            return Err("active session has no current block".to_string());
        }
        Ok(Self {
            name: raw.name,
            current_block_idx: raw.current_block_idx,
            status: raw.status,
            start_dt: raw.start_dt,
            end_dt: raw.end_dt,
            blocks: raw.blocks,
        })
    }
}

fn clamp(d: Duration) -> Duration {
    d.max(Duration::zero())
}
