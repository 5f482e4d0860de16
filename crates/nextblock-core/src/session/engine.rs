//! Advancement engine.
//!
//! Pure transitions over [`Session`] values. No I/O and no clock reads: the
//! caller passes `now` and decides whether to persist or delete the result.
//!
//! ## State Transitions
//!
//! ```text
//! start ──> Active ──advance (blocks remain)──> Active
//!             │
//!             ├──advance (last block)──> Inactive
//!             └──stop──────────────────> Inactive
//! ```
//!
//! `Inactive` is terminal: both `advance` and `stop` reject it with
//! [`CoreError::NotActive`].

use chrono::{DateTime, Utc};

use super::state::Session;
use crate::error::{CoreError, PlanError, Result};
use crate::plan::Plan;

/// Build a fresh session from a plan. The first block starts at `now`.
pub fn start(plan: &Plan, now: DateTime<Utc>) -> Result<Session> {
    if plan.blocks.is_empty() {
        return Err(PlanError::NoBlocks {
            name: plan.name.clone(),
        }
        .into());
    }
    Ok(Session::begin(plan.name.clone(), plan.blocks.clone(), now))
}

/// Close the current block and move the cursor forward, ending the session
/// when the cursor runs past the last block.
pub fn advance(session: &Session, now: DateTime<Utc>) -> Result<Session> {
    ensure_active(session)?;

    let mut next = session.clone();
    if let Some(block) = next.current_block_mut() {
        block.mark_ended(now);
    }

    let next_idx = session.current_block_idx() + 1;
    next.set_cursor(next_idx);
    match next.current_block_mut() {
        Some(block) => block.mark_started(now),
        None => next.finish(now),
    }
    Ok(next)
}

/// Abort the session. Cursor and block timestamps are left as they were.
pub fn stop(session: &Session, now: DateTime<Utc>) -> Result<Session> {
    ensure_active(session)?;

    let mut next = session.clone();
    next.finish(now);
    Ok(next)
}

fn ensure_active(session: &Session) -> Result<()> {
    if session.is_active() {
        Ok(())
    } else {
        Err(CoreError::NotActive {
            session: session.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Block, SessionStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn plan(n: usize) -> Plan {
        Plan {
            name: "Workday".into(),
            blocks: (0..n).map(|i| Block::new(format!("block-{i}"), 25)).collect(),
        }
    }

    #[test]
    fn start_rejects_empty_plan() {
        let err = start(&plan(0), t0()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidPlan(PlanError::NoBlocks { .. })
        ));
    }

    #[test]
    fn advance_moves_cursor_by_one() {
        let session = start(&plan(3), t0()).unwrap();
        let later = t0() + Duration::minutes(20);
        let next = advance(&session, later).unwrap();

        assert_eq!(next.status(), SessionStatus::Active);
        assert_eq!(next.current_block_idx(), 1);
        assert_eq!(next.blocks()[0].end_time(), Some(later));
        assert_eq!(next.blocks()[1].start_time(), Some(later));
        assert!(next.end_dt().is_none());
        // Input snapshot is untouched.
        assert_eq!(session.current_block_idx(), 0);
        assert!(session.blocks()[0].end_time().is_none());
    }

    #[test]
    fn advance_past_last_block_ends_session() {
        let mut session = start(&plan(2), t0()).unwrap();
        session = advance(&session, t0() + Duration::minutes(25)).unwrap();
        let end = t0() + Duration::minutes(55);
        let done = advance(&session, end).unwrap();

        assert_eq!(done.status(), SessionStatus::Inactive);
        assert_eq!(done.current_block_idx(), 2);
        assert!(done.current_block().is_none());
        assert_eq!(done.end_dt(), Some(end));
        assert_eq!(done.blocks()[1].end_time(), Some(end));
    }

    #[test]
    fn advance_on_inactive_is_rejected() {
        let session = start(&plan(1), t0()).unwrap();
        let done = advance(&session, t0() + Duration::minutes(30)).unwrap();
        let err = advance(&done, t0() + Duration::minutes(40)).unwrap_err();
        assert!(matches!(err, CoreError::NotActive { .. }));
        assert_eq!(done.blocks()[0].end_time(), Some(t0() + Duration::minutes(30)));
    }

    #[test]
    fn stop_keeps_cursor_and_block_times() {
        let session = start(&plan(3), t0()).unwrap();
        let session = advance(&session, t0() + Duration::minutes(25)).unwrap();
        let at = t0() + Duration::minutes(30);
        let stopped = stop(&session, at).unwrap();

        assert_eq!(stopped.status(), SessionStatus::Inactive);
        assert_eq!(stopped.current_block_idx(), 1);
        assert_eq!(stopped.end_dt(), Some(at));
        assert_eq!(stopped.blocks(), session.blocks());
    }

    #[test]
    fn stop_on_inactive_is_rejected() {
        let session = start(&plan(2), t0()).unwrap();
        let stopped = stop(&session, t0()).unwrap();
        assert!(matches!(
            stop(&stopped, t0()).unwrap_err(),
            CoreError::NotActive { .. }
        ));
        assert!(advance(&stopped, t0()).is_err());
    }
}
