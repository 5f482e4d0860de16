//! Interactive session commands. These are the only writers of the
//! session record.

use std::path::Path;

use chrono::{Duration, Utc};
use nextblock_core::heartbeat::Heartbeat;
use nextblock_core::session;
use nextblock_core::{
    Block, Config, CoreError, DesktopNotifier, FileSessionStore, Plan, Session, SessionStore,
};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn start(plan_path: &Path) -> CmdResult {
    let store = FileSessionStore::open_default()?;
    if store.exists() {
        return Err(CoreError::SessionExists {
            path: store.path().to_path_buf(),
        }
        .into());
    }

    let plan = Plan::load(plan_path).map_err(CoreError::from)?;
    let session = session::start(&plan, Utc::now())?;
    store.save(&session)?;
    tracing::info!(session = session.name(), blocks = session.blocks().len(), "session started");

    println!(
        "Started session '{}' with {} blocks ({} min planned)",
        session.name(),
        session.blocks().len(),
        plan.total_duration_min()
    );
    if let Some(block) = session.current_block() {
        println!("Current block: {} ({} min)", block.name(), block.planned_duration());
    }
    Ok(())
}

pub fn next() -> CmdResult {
    let store = FileSessionStore::open_default()?;
    let current = store.try_load()?.ok_or(CoreError::NoActiveSession)?;
    let now = Utc::now();
    let finished = current.current_block().map(|b| (b.name().to_string(), b.elapsed(now)));
    let advanced = session::advance(&current, now)?;

    if let Some((name, elapsed)) = finished {
        println!("Finished '{}' after {}", name, format_duration(elapsed));
    }

    match advanced.current_block().filter(|_| advanced.is_active()) {
        Some(block) => {
            store.save(&advanced)?;
            tracing::info!(
                session = advanced.name(),
                block = block.name(),
                index = advanced.current_block_idx(),
                "advanced to next block"
            );
            println!(
                "Block {}/{}: {} ({} min)",
                advanced.current_block_idx() + 1,
                advanced.blocks().len(),
                block.name(),
                block.planned_duration()
            );
            announce(&advanced, block);
        }
        None => {
            store.delete()?;
            tracing::info!(session = advanced.name(), "session completed");
            println!("All blocks completed. Session ended.");
        }
    }
    Ok(())
}

pub fn status(json: bool) -> CmdResult {
    let store = FileSessionStore::open_default()?;
    let session = store.load();
    let now = Utc::now();

    if json {
        let beat = Heartbeat::from_session(session.as_ref(), now);
        println!("{}", serde_json::to_string_pretty(&beat.data)?);
        return Ok(());
    }

    let Some(session) = session else {
        println!("No active session");
        return Ok(());
    };
    println!("Session: {} ({})", session.name(), session.status().as_str());
    match session.current_block() {
        Some(block) => {
            println!(
                "Block {}/{}: {}",
                session.current_block_idx() + 1,
                session.blocks().len(),
                block.name()
            );
            println!("Planned: {} min", block.planned_duration());
            let overtime = block.extended(now);
            if overtime > Duration::zero() {
                println!(
                    "Elapsed: {} (overtime +{})",
                    format_duration(block.elapsed(now)),
                    format_duration(overtime)
                );
            } else {
                println!("Elapsed: {}", format_duration(block.elapsed(now)));
            }
        }
        None => println!("No current block"),
    }
    println!("Session elapsed: {}", format_duration(session.elapsed(now)));
    Ok(())
}

pub fn stop() -> CmdResult {
    let store = FileSessionStore::open_default()?;
    match store.try_load() {
        Ok(None) => return Err(CoreError::NoActiveSession.into()),
        Ok(Some(current)) => {
            if current.is_active() {
                let stopped = session::stop(&current, Utc::now())?;
                tracing::info!(
                    session = stopped.name(),
                    elapsed_secs = stopped.elapsed(Utc::now()).num_seconds(),
                    "session stopped"
                );
            }
            store.delete()?;
            println!("Session '{}' stopped.", current.name());
        }
        Err(e) => {
            tracing::warn!(error = %e, "removing unreadable session state");
            store.delete()?;
            println!("Session stopped.");
        }
    }
    Ok(())
}

/// Desktop popup for a newly started block. Best effort.
fn announce(session: &Session, block: &Block) {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "skipping block announcement");
            return;
        }
    };
    if !config.notifications.enabled {
        return;
    }
    let notifier = DesktopNotifier::new(config.notifications.app_name);
    let message = format!("{} just started!", block.name());
    if let Err(e) = notifier.show(session.name(), &message) {
        tracing::warn!(error = %e, "failed to show notification");
    }
}

/// `H:MM:SS`, or `MM:SS` under an hour.
fn format_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_short_and_long_durations() {
        assert_eq!(format_duration(Duration::seconds(0)), "00:00");
        assert_eq!(format_duration(Duration::seconds(754)), "12:34");
        assert_eq!(format_duration(Duration::seconds(3_725)), "1:02:05");
        assert_eq!(format_duration(Duration::seconds(-5)), "00:00");
    }
}
