//! Durable session record.
//!
//! One JSON document at a well-known path. The CLI is the only writer; the
//! watcher only reads. Writes go to a temp file in the same directory which
//! is then renamed over the record, so a concurrent reader sees either the
//! old record or the new one, never a partial write.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use super::state_dir;
use crate::error::{CoreError, Result};
use crate::session::Session;

pub const STATE_FILE_NAME: &str = "session_state.json";

pub trait SessionStore {
    /// Distinguishes "no record" (`Ok(None)`) from an unreadable record.
    fn try_load(&self) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    /// Returns whether a record existed.
    fn delete(&self) -> Result<bool>;

    fn exists(&self) -> bool;

    /// Lenient load: a corrupt or unreadable record reads as no session.
    fn load(&self) -> Option<Session> {
        match self.try_load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session state");
                None
            }
        }
    }
}

/// File-backed store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<state dir>/session_state.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(state_dir()?.join(STATE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_err(&self, source: std::io::Error) -> CoreError {
        CoreError::Persist {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn try_load(&self) -> Result<Option<Session>> {
        // Raw bytes: invalid UTF-8 is a corrupt record, not an I/O failure.
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| CoreError::CorruptState {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, session: &Session) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| self.persist_err(e))?;

        let content = serde_json::to_string_pretty(session)
            .map_err(|e| self.persist_err(std::io::Error::other(e)))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| self.persist_err(e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| self.persist_err(e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| self.persist_err(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.persist_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "session state saved");
        Ok(())
    }

    fn delete(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.persist_err(e)),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// In-memory store holding the serialized record, so it exercises the same
/// encoding as the file store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw record contents, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn try_load(&self) -> Result<Option<Session>> {
        match self.record().as_deref() {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|source| CoreError::CorruptState {
                    path: PathBuf::from("<memory>"),
                    source,
                }),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session).map_err(|e| CoreError::Persist {
            path: PathBuf::from("<memory>"),
            source: std::io::Error::other(e),
        })?;
        *self.record() = Some(raw);
        Ok(())
    }

    fn delete(&self) -> Result<bool> {
        Ok(self.record().take().is_some())
    }

    fn exists(&self) -> bool {
        self.record().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;
    use crate::session::{self, Block};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample() -> Session {
        let plan = Plan {
            name: "Writing day".into(),
            blocks: vec![Block::new("Outline", 25), Block::new("Draft", 50)],
        };
        session::start(&plan, t0()).unwrap()
    }

    #[test]
    fn test_persistence_round_trip() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("state.json"));
        let session = session::advance(&sample(), t0() + Duration::minutes(30)).unwrap();

        store.save(&session).unwrap();
        assert_eq!(store.try_load().unwrap(), Some(session));
    }

    #[test]
    fn missing_record_loads_as_none() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("state.json"));
        assert!(!store.exists());
        assert!(store.try_load().unwrap().is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_record_is_reported_by_try_load_and_absent_for_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "{\"name\": \"half").unwrap();
        let store = FileSessionStore::new(&path);

        assert!(matches!(
            store.try_load(),
            Err(CoreError::CorruptState { .. })
        ));
        assert!(store.load().is_none());
        assert!(store.exists());
    }

    #[test]
    fn non_utf8_record_is_corrupt() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, [0x7b, 0xff, 0xfe, 0x7d]).unwrap();
        let store = FileSessionStore::new(&path);

        assert!(matches!(
            store.try_load(),
            Err(CoreError::CorruptState { .. })
        ));
        assert!(store.load().is_none());
    }

    #[test]
    fn delete_reports_whether_record_existed() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("state.json"));
        store.save(&sample()).unwrap();

        assert!(store.delete().unwrap());
        assert!(!store.exists());
        assert!(store.load().is_none());
        assert!(!store.delete().unwrap());
    }

    #[test]
    fn save_replaces_without_leaving_temp_files() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("state.json"));
        let first = sample();
        let second = session::advance(&first, t0() + Duration::minutes(25)).unwrap();

        store.save(&first).unwrap();
        store.save(&second).unwrap();

        assert_eq!(store.load(), Some(second));
        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_creates_missing_parent_dir() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("nested").join("state.json"));
        store.save(&sample()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn record_uses_documented_field_names() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("state.json"));
        store.save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["name"], "Writing day");
        assert_eq!(raw["current_block_idx"], 0);
        assert_eq!(raw["status"], "active");
        assert!(raw["end_dt"].is_null());
        assert_eq!(raw["blocks"][0]["planned_duration"], 25);
        assert!(raw["blocks"][0]["start_dt"].is_string());
        assert!(raw["blocks"][1]["start_dt"].is_null());
    }

    #[test]
    fn memory_store_matches_file_semantics() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), Some(sample()));
        assert!(store.delete().unwrap());
        assert!(!store.exists());

        let corrupt = MemorySessionStore::with_raw("not json");
        assert!(corrupt.try_load().is_err());
        assert!(corrupt.load().is_none());
    }

    fn arb_session() -> impl Strategy<Value = Session> {
        (
            "[a-zA-Z][a-zA-Z0-9 ]{0,15}",
            prop::collection::vec(("[a-z]{1,8}", 0u32..240), 1..6),
            prop::collection::vec(1i64..10_000, 0..7),
            any::<bool>(),
        )
            .prop_map(|(name, blocks, steps, stop)| {
                let plan = Plan {
                    name,
                    blocks: blocks
                        .into_iter()
                        .map(|(n, d)| Block::new(n, d))
                        .collect(),
                };
                let mut now = t0();
                let mut s = session::start(&plan, now).unwrap();
                for secs in steps {
                    now += Duration::milliseconds(secs * 1_001);
                    match session::advance(&s, now) {
                        Ok(next) => s = next,
                        Err(_) => break,
                    }
                }
                if stop {
                    if let Ok(stopped) = session::stop(&s, now) {
                        s = stopped;
                    }
                }
                s
            })
    }

    proptest! {
        #[test]
        fn serialization_round_trips(s in arb_session()) {
            let json = serde_json::to_string(&s).unwrap();
            let back: Session = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, s);
        }

        #[test]
        fn memory_store_round_trips(s in arb_session()) {
            let store = MemorySessionStore::new();
            store.save(&s).unwrap();
            prop_assert_eq!(store.load(), Some(s));
        }
    }
}
