//! Typed records on top of a `KeyValueStore`.
//!
//! Key layout:
//! - `users`            credentials map (email → password record)
//! - `current_user`     email of the logged-in account
//! - `workouts/<email>` completed sessions, newest first
//! - `routine/<email>`  the working routine being built

use crate::store::KeyValueStore;
use crate::{CompletedSession, Credentials, Result, Routine};
use serde::de::DeserializeOwned;
use serde::Serialize;

const USERS_KEY: &str = "users";
const CURRENT_USER_KEY: &str = "current_user";
const HISTORY_PREFIX: &str = "workouts/";
const ROUTINE_PREFIX: &str = "routine/";

/// Storage collaborator for everything the planner persists
pub struct Repository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a JSON record; a corrupted record reads as `None` with a warning
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Ignoring corrupted record {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn load_history(&self, user: &str) -> Result<Vec<CompletedSession>> {
        Ok(self
            .read(&format!("{}{}", HISTORY_PREFIX, user))?
            .unwrap_or_default())
    }

    pub fn save_history(&mut self, user: &str, sessions: &[CompletedSession]) -> Result<()> {
        self.write(&format!("{}{}", HISTORY_PREFIX, user), sessions)?;
        tracing::debug!("Saved {} sessions for {}", sessions.len(), user);
        Ok(())
    }

    /// Every user that has a stored history, sorted
    pub fn history_users(&self) -> Result<Vec<String>> {
        let mut users: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(HISTORY_PREFIX).map(str::to_string))
            .collect();
        users.sort();
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Credentials and current user
    // ------------------------------------------------------------------

    pub fn load_credentials(&self) -> Result<Credentials> {
        Ok(self.read(USERS_KEY)?.unwrap_or_default())
    }

    pub fn save_credentials(&mut self, credentials: &Credentials) -> Result<()> {
        self.write(USERS_KEY, credentials)
    }

    pub fn load_current_user(&self) -> Result<Option<String>> {
        self.store.get(CURRENT_USER_KEY)
    }

    pub fn save_current_user(&mut self, email: &str) -> Result<()> {
        self.store.set(CURRENT_USER_KEY, email)
    }

    pub fn clear_current_user(&mut self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY)
    }

    // ------------------------------------------------------------------
    // Working routine
    // ------------------------------------------------------------------

    pub fn load_routine(&self, user: &str) -> Result<Routine> {
        Ok(self
            .read(&format!("{}{}", ROUTINE_PREFIX, user))?
            .unwrap_or_default())
    }

    pub fn save_routine(&mut self, user: &str, routine: &Routine) -> Result<()> {
        let key = format!("{}{}", ROUTINE_PREFIX, user);
        if routine.is_empty() {
            self.store.remove(&key)
        } else {
            self.write(&key, routine)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::PasswordRecord;
    use chrono::Utc;

    fn repo() -> Repository<MemoryStore> {
        Repository::new(MemoryStore::new())
    }

    #[test]
    fn test_history_defaults_to_empty() {
        let repo = repo();
        assert!(repo.load_history("nobody@example.com").unwrap().is_empty());
    }

    #[test]
    fn test_history_roundtrip_and_users() {
        let mut repo = repo();
        let mut routine = Routine::new();
        routine.add_step("Squat", 30, 30).unwrap();
        let session = CompletedSession::from_routine(routine, Utc::now()).with_memo("good");

        repo.save_history("b@example.com", &[session.clone()]).unwrap();
        repo.save_history("a@example.com", &[]).unwrap();

        let loaded = repo.load_history("b@example.com").unwrap();
        assert_eq!(loaded, vec![session]);
        assert_eq!(
            repo.history_users().unwrap(),
            vec!["a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn test_corrupted_history_reads_empty() {
        let mut store = MemoryStore::new();
        store.set("workouts/x@example.com", "[{broken").unwrap();
        let repo = Repository::new(store);
        assert!(repo.load_history("x@example.com").unwrap().is_empty());
    }

    #[test]
    fn test_credentials_and_current_user() {
        let mut repo = repo();
        let mut creds = Credentials::new();
        creds.insert(
            "a@example.com".into(),
            PasswordRecord {
                password: "pw".into(),
            },
        );
        repo.save_credentials(&creds).unwrap();
        assert_eq!(repo.load_credentials().unwrap(), creds);

        repo.save_current_user("a@example.com").unwrap();
        assert_eq!(
            repo.load_current_user().unwrap().as_deref(),
            Some("a@example.com")
        );
        repo.clear_current_user().unwrap();
        assert_eq!(repo.load_current_user().unwrap(), None);
    }

    #[test]
    fn test_empty_routine_removes_record() {
        let mut repo = repo();
        let mut routine = Routine::new();
        routine.add_step("Plank", 40, 20).unwrap();
        repo.save_routine("a@example.com", &routine).unwrap();
        assert_eq!(repo.load_routine("a@example.com").unwrap(), routine);

        repo.save_routine("a@example.com", &Routine::new()).unwrap();
        assert!(repo.store().get("routine/a@example.com").unwrap().is_none());
    }
}
