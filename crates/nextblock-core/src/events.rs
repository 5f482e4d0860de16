use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-facing event decided by the threshold tracker.
/// The watcher turns each one into exactly one desktop notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// Block is about to reach its planned duration.
    BeforeEnd {
        session: String,
        block: String,
        minutes_left: u32,
        at: DateTime<Utc>,
    },
    /// Block reached its planned duration (overtime interval 0).
    ReachedPlanned {
        session: String,
        block: String,
        planned_minutes: u32,
        at: DateTime<Utc>,
    },
    /// Repeating overtime reminder, interval >= 1.
    Overtime {
        session: String,
        block: String,
        interval: u64,
        overtime_minutes: u64,
        at: DateTime<Utc>,
    },
}

impl Notice {
    pub fn title(&self) -> &str {
        match self {
            Notice::BeforeEnd { session, .. }
            | Notice::ReachedPlanned { session, .. }
            | Notice::Overtime { session, .. } => session,
        }
    }

    pub fn block(&self) -> &str {
        match self {
            Notice::BeforeEnd { block, .. }
            | Notice::ReachedPlanned { block, .. }
            | Notice::Overtime { block, .. } => block,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::BeforeEnd {
                block,
                minutes_left,
                ..
            } => format!("{block} ends in {minutes_left} minutes"),
            Notice::ReachedPlanned {
                block,
                planned_minutes,
                ..
            } => format!("{block} reached {planned_minutes} minutes!"),
            Notice::Overtime {
                block,
                overtime_minutes,
                ..
            } => format!("Overtime: +{overtime_minutes}m for {block}"),
        }
    }
}
