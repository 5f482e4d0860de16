//! Notification threshold tracking.
//!
//! Called once per poll cycle with the freshly loaded session. Decides which
//! of the three notice kinds are due for the current block and remembers
//! what already fired so each (block, kind, interval) fires at most once.
//!
//! ```text
//!   0 ─────────── planned - before ─────── planned ──── +every ──── +2·every ──
//!                  BeforeEnd               Reached      Overtime#1   Overtime#2
//! ```
//!
//! With [`OvertimePolicy::Skip`] a delayed cycle that jumps from interval 0
//! to interval 2 never emits interval 1. [`OvertimePolicy::Backfill`] only
//! fills gaps the tracker itself observed, at most a dozen per cycle.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Notice;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvertimePolicy {
    /// Only the interval observed this cycle fires; missed ones are dropped.
    #[default]
    Skip,
    /// Every unfired interval up to the current one fires, oldest first.
    Backfill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    pub enabled: bool,
    pub before_minutes: u32,
    /// 0 disables the repeating overtime reminders.
    pub after_every_minutes: u32,
    pub overtime: OvertimePolicy,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            before_minutes: 5,
            after_every_minutes: 5,
            overtime: OvertimePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FiredKey {
    Before { block: String },
    After { block: String, interval: u64 },
}

impl FiredKey {
    fn block(&self) -> &str {
        match self {
            FiredKey::Before { block } | FiredKey::After { block, .. } => block,
        }
    }
}

/// Most missed overtime intervals a single backfill cycle may emit.
const MAX_BACKFILL: u64 = 12;

/// The block run seen on the previous cycle.
#[derive(Debug, Clone, PartialEq)]
struct BlockRun {
    name: String,
    start: Option<DateTime<Utc>>,
    /// Overtime interval at the first sighting, 0 if it was not yet in
    /// overtime. Backfill never reaches below it: the tracker cannot know
    /// what fired before it saw the block.
    first_interval: u64,
}

/// Long-lived de-duplication state. Not persisted: a restart forgets it.
#[derive(Debug)]
pub struct NotificationTracker {
    policy: ThresholdPolicy,
    fired: HashSet<FiredKey>,
    current: Option<BlockRun>,
}

impl NotificationTracker {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self {
            policy,
            fired: HashSet::new(),
            current: None,
        }
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    pub fn has_fired(&self, key: &FiredKey) -> bool {
        self.fired.contains(key)
    }

    /// Decide the notices due this cycle. `time_scale` multiplies real
    /// elapsed time (1.0 outside testing mode).
    pub fn evaluate(
        &mut self,
        session: Option<&Session>,
        now: DateTime<Utc>,
        time_scale: f64,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();
        if !self.policy.enabled {
            return notices;
        }
        let Some(session) = session.filter(|s| s.is_active()) else {
            return notices;
        };
        let Some(block) = session.current_block() else {
            return notices;
        };
        if !block.is_started() {
            return notices;
        }

        let elapsed_seconds = block.elapsed(now).num_milliseconds() as f64 / 1000.0 * time_scale;
        let planned_seconds = block.planned_seconds() as f64;
        let overtime_seconds = elapsed_seconds - planned_seconds;
        let interval = match self.policy.after_every_minutes {
            _ if overtime_seconds < 0.0 => 0,
            0 => 0,
            every => (overtime_seconds / (f64::from(every) * 60.0)).floor() as u64,
        };

        let same_run = self
            .current
            .as_ref()
            .is_some_and(|run| run.name == block.name() && run.start == block.start_time());
        if !same_run {
            self.fired.retain(|key| key.block() != block.name());
            self.current = Some(BlockRun {
                name: block.name().to_string(),
                start: block.start_time(),
                first_interval: interval,
            });
        }
        let first_interval = self.current.as_ref().map_or(0, |run| run.first_interval);

        let before_threshold = planned_seconds - f64::from(self.policy.before_minutes) * 60.0;
        if elapsed_seconds >= before_threshold {
            let key = FiredKey::Before {
                block: block.name().to_string(),
            };
            if self.fired.insert(key) {
                notices.push(Notice::BeforeEnd {
                    session: session.name().to_string(),
                    block: block.name().to_string(),
                    minutes_left: self.policy.before_minutes,
                    at: now,
                });
            }
        }

        if elapsed_seconds >= planned_seconds {
            let first = match self.policy.overtime {
                OvertimePolicy::Skip => interval,
                OvertimePolicy::Backfill => first_interval
                    .max(interval.saturating_sub(MAX_BACKFILL - 1)),
            };
            for i in first..=interval {
                let key = FiredKey::After {
                    block: block.name().to_string(),
                    interval: i,
                };
                if !self.fired.insert(key) {
                    continue;
                }
                let notice = if i == 0 {
                    Notice::ReachedPlanned {
                        session: session.name().to_string(),
                        block: block.name().to_string(),
                        planned_minutes: block.planned_duration(),
                        at: now,
                    }
                } else {
                    let overtime_minutes = if i == interval {
                        (overtime_seconds / 60.0).floor() as u64
                    } else {
                        i.saturating_mul(u64::from(self.policy.after_every_minutes))
                    };
                    Notice::Overtime {
                        session: session.name().to_string(),
                        block: block.name().to_string(),
                        interval: i,
                        overtime_minutes,
                        at: now,
                    }
                };
                notices.push(notice);
            }
        }

        notices
    }
}
