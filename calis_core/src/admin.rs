//! Administrator view over every user's history.
//!
//! Read-only aggregation plus a CSV export for offline review.

use crate::repository::Repository;
use crate::store::KeyValueStore;
use crate::{CompletedSession, Result};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

/// One exported history row
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    user: String,
    id: String,
    performed_at: String,
    total_seconds: u32,
    step_count: usize,
    exercises: String,
    memo: Option<String>,
}

impl CsvRow {
    fn new(user: &str, session: &CompletedSession) -> Self {
        CsvRow {
            user: user.to_string(),
            id: session.id.to_string(),
            performed_at: session.performed_at.to_rfc3339(),
            total_seconds: session.total_seconds,
            step_count: session.routine.len(),
            exercises: session
                .routine
                .steps()
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            memo: session.memo.clone(),
        }
    }
}

/// Registered members and all stored histories
#[derive(Clone, Debug, Default)]
pub struct AdminOverview {
    pub members: Vec<String>,
    pub histories: BTreeMap<String, Vec<CompletedSession>>,
}

impl AdminOverview {
    /// Gather members (excluding the administrator) and every history
    pub fn load<S: KeyValueStore>(repo: &Repository<S>, admin_email: &str) -> Result<Self> {
        let members: Vec<String> = repo
            .load_credentials()?
            .into_keys()
            .filter(|email| email != admin_email)
            .collect();

        let mut histories = BTreeMap::new();
        for user in repo.history_users()? {
            if user == admin_email {
                continue;
            }
            histories.insert(user.clone(), repo.load_history(&user)?);
        }

        tracing::info!(
            "Admin overview: {} members, {} histories",
            members.len(),
            histories.len()
        );
        Ok(Self { members, histories })
    }

    /// History of one user; empty if they never saved a session
    pub fn history_of(&self, user: &str) -> &[CompletedSession] {
        self.histories.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn session_count(&self) -> usize {
        self.histories.values().map(Vec::len).sum()
    }

    /// Append every session to a CSV file and sync it to disk
    ///
    /// Headers are written only when the file is new or empty. Returns the
    /// number of rows written.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_headers = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_headers)
            .from_writer(&file);

        let mut count = 0;
        for (user, sessions) in &self.histories {
            for session in sessions {
                writer.serialize(CsvRow::new(user, session))?;
                count += 1;
            }
        }

        writer.flush()?;
        drop(writer);
        file.sync_all()?;

        tracing::info!("Exported {} sessions to {:?}", count, path);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::{Credentials, PasswordRecord, Routine};
    use chrono::Utc;

    fn seeded_repo() -> Repository<MemoryStore> {
        let mut repo = Repository::new(MemoryStore::new());

        let mut creds = Credentials::new();
        for email in ["b@example.com", "a@example.com"] {
            creds.insert(
                email.into(),
                PasswordRecord {
                    password: "pw".into(),
                },
            );
        }
        repo.save_credentials(&creds).unwrap();

        let mut routine = Routine::new();
        routine.add_step("Push-up", 45, 15).unwrap();
        routine.add_step("Squat", 45, 15).unwrap();
        let session = CompletedSession::from_routine(routine, Utc::now()).with_memo("tough, day");
        repo.save_history("a@example.com", &[session]).unwrap();
        repo.save_history("admin@admin.com", &[]).unwrap();
        repo
    }

    #[test]
    fn test_overview_lists_members_without_admin() {
        let repo = seeded_repo();
        let overview = AdminOverview::load(&repo, "admin@admin.com").unwrap();

        assert_eq!(overview.members, vec!["a@example.com", "b@example.com"]);
        assert_eq!(overview.history_of("a@example.com").len(), 1);
        assert!(overview.history_of("b@example.com").is_empty());
        assert!(!overview.histories.contains_key("admin@admin.com"));
        assert_eq!(overview.session_count(), 1);
    }

    #[test]
    fn test_export_csv_writes_headers_once() {
        let repo = seeded_repo();
        let overview = AdminOverview::load(&repo, "admin@admin.com").unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export").join("history.csv");

        assert_eq!(overview.export_csv(&path).unwrap(), 1);
        assert_eq!(overview.export_csv(&path).unwrap(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("user,id,performed_at").count(), 1);
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("Push-up;Squat"));
        assert!(content.contains("\"tough, day\""));
    }
}
