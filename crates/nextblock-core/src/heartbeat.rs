//! Heartbeat payload sent once per poll cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heartbeat {
    pub timestamp: DateTime<Utc>,
    /// Flat key-value description of the session and its current block.
    pub data: Map<String, Value>,
}

impl Heartbeat {
    /// Build the payload from one consistent session snapshot.
    pub fn from_session(session: Option<&Session>, now: DateTime<Utc>) -> Self {
        let mut data = Map::new();
        let Some(session) = session else {
            data.insert("session_status".into(), json!("no_active_session"));
            return Self {
                timestamp: now,
                data,
            };
        };

        data.insert("session_name".into(), json!(session.name()));
        data.insert("session_status".into(), json!(session.status().as_str()));
        data.insert("current_block_idx".into(), json!(session.current_block_idx()));
        data.insert("total_blocks".into(), json!(session.blocks().len()));
        data.insert("start_time".into(), json!(session.start_dt()));
        data.insert("end_time".into(), json!(session.end_dt()));

        if let Some(block) = session.current_block() {
            data.insert("current_block_name".into(), json!(block.name()));
            data.insert("planned_duration".into(), json!(block.planned_duration()));
            data.insert("block_start_time".into(), json!(block.start_time()));
            data.insert("block_end_time".into(), json!(block.end_time()));
            data.insert(
                "elapsed_seconds".into(),
                json!(block.elapsed(now).num_seconds()),
            );
            data.insert(
                "extended_seconds".into(),
                json!(block.extended(now).num_seconds()),
            );
        }

        Self {
            timestamp: now,
            data,
        }
    }

    pub fn session_status(&self) -> Option<&str> {
        self.data.get("session_status").and_then(Value::as_str)
    }
}
