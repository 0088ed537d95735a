//! Per-user workout history.
//!
//! The in-memory log is authoritative for the current run. Every change is
//! written through to the repository; a failed write is logged and the log
//! keeps the change.

use crate::repository::Repository;
use crate::store::KeyValueStore;
use crate::CompletedSession;
use uuid::Uuid;

/// Completed sessions of one user, newest first
#[derive(Clone, Debug)]
pub struct WorkoutLog {
    user: String,
    sessions: Vec<CompletedSession>,
}

impl WorkoutLog {
    /// Load a user's history; read failures give an empty log
    pub fn load<S: KeyValueStore>(repo: &Repository<S>, user: &str) -> Self {
        let sessions = match repo.load_history(user) {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Failed to load history for {}: {}. Starting empty.", user, e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} sessions for {}", sessions.len(), user);
        Self {
            user: user.to_string(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &[CompletedSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Add a session at the front and persist
    ///
    /// Returns whether the write succeeded.
    pub fn record<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
        session: CompletedSession,
    ) -> bool {
        tracing::info!(
            "Recording session {} ({}s) for {}",
            session.id,
            session.total_seconds,
            self.user
        );
        self.sessions.insert(0, session);
        self.persist(repo)
    }

    /// Delete a session by id and persist
    ///
    /// Returns `None` if no such session exists, otherwise whether the write
    /// succeeded.
    pub fn delete<S: KeyValueStore>(&mut self, repo: &mut Repository<S>, id: Uuid) -> Option<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return None;
        }
        tracing::info!("Deleted session {} for {}", id, self.user);
        Some(self.persist(repo))
    }

    fn persist<S: KeyValueStore>(&self, repo: &mut Repository<S>) -> bool {
        match repo.save_history(&self.user, &self.sessions) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save history for {}: {}", self.user, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::{Error, Result, Routine};
    use chrono::{Duration, Utc};

    fn session(name: &str, days_ago: i64) -> CompletedSession {
        let mut routine = Routine::new();
        routine.add_step(name, 45, 15).unwrap();
        CompletedSession::from_routine(routine, Utc::now() - Duration::days(days_ago))
    }

    /// Store whose writes always fail
    #[derive(Default)]
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("disk full".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(Error::Storage("disk full".into()))
        }
        fn keys(&self) -> Result<Vec<String>> {
            self.0.keys()
        }
    }

    #[test]
    fn test_record_prepends_and_persists() {
        let mut repo = Repository::new(MemoryStore::new());
        let mut log = WorkoutLog::load(&repo, "a@example.com");
        assert!(log.is_empty());

        assert!(log.record(&mut repo, session("Squat", 2)));
        assert!(log.record(&mut repo, session("Lunge", 1)));

        assert_eq!(log.sessions()[0].routine.steps()[0].name, "Lunge");

        let reloaded = WorkoutLog::load(&repo, "a@example.com");
        assert_eq!(reloaded.sessions(), log.sessions());
    }

    #[test]
    fn test_delete_by_id() {
        let mut repo = Repository::new(MemoryStore::new());
        let mut log = WorkoutLog::load(&repo, "a@example.com");
        let keep = session("Plank", 1);
        let removed = session("Crunch", 0);
        let removed_id = removed.id;
        log.record(&mut repo, keep.clone());
        log.record(&mut repo, removed);

        assert_eq!(log.delete(&mut repo, removed_id), Some(true));
        assert_eq!(log.delete(&mut repo, removed_id), None);
        assert_eq!(WorkoutLog::load(&repo, "a@example.com").sessions(), &[keep]);
    }

    #[test]
    fn test_failed_write_keeps_in_memory_state() {
        let mut repo = Repository::new(ReadOnlyStore::default());
        let mut log = WorkoutLog::load(&repo, "a@example.com");

        assert!(!log.record(&mut repo, session("Superman", 0)));
        assert_eq!(log.sessions().len(), 1);
    }

    #[test]
    fn test_memo_is_trimmed_and_blank_dropped() {
        let s = session("Squat", 0).with_memo("  felt strong  ");
        assert_eq!(s.memo.as_deref(), Some("felt strong"));

        let s = session("Squat", 0).with_memo("   ");
        assert_eq!(s.memo, None);
    }
}
