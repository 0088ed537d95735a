//! Sign-up, log-in and the current-user marker.
//!
//! Passwords are compared in plaintext. The administrator account comes from
//! configuration and is never stored with the member credentials.

use crate::config::AdminConfig;
use crate::repository::Repository;
use crate::store::KeyValueStore;
use crate::{Account, Error, PasswordRecord, Result};

/// Account operations over a repository
pub struct Accounts<'a, S: KeyValueStore> {
    repo: &'a mut Repository<S>,
    admin: &'a AdminConfig,
}

impl<'a, S: KeyValueStore> Accounts<'a, S> {
    pub fn new(repo: &'a mut Repository<S>, admin: &'a AdminConfig) -> Self {
        Self { repo, admin }
    }

    /// Register a member and log them in
    pub fn sign_up(&mut self, email: &str, password: &str) -> Result<Account> {
        let email = require_credentials(email, password)?;
        if email == self.admin.email {
            return Err(Error::Auth("This email is reserved".into()));
        }

        let mut credentials = self.repo.load_credentials()?;
        if credentials.contains_key(email) {
            return Err(Error::Auth(format!("{} is already registered", email)));
        }
        credentials.insert(
            email.to_string(),
            PasswordRecord {
                password: password.to_string(),
            },
        );
        self.repo.save_credentials(&credentials)?;
        tracing::info!("Registered {}", email);

        self.establish(Account::Member(email.to_string()))
    }

    /// Check credentials and remember the logged-in account
    pub fn log_in(&mut self, email: &str, password: &str) -> Result<Account> {
        let email = require_credentials(email, password)?;

        if email == self.admin.email && password == self.admin.password {
            return self.establish(Account::Admin(email.to_string()));
        }

        let credentials = self.repo.load_credentials()?;
        match credentials.get(email) {
            Some(record) if record.password == password => {
                self.establish(Account::Member(email.to_string()))
            }
            _ => {
                tracing::warn!("Rejected login for {}", email);
                Err(Error::Auth("Wrong email or password".into()))
            }
        }
    }

    pub fn log_out(&mut self) -> Result<()> {
        self.repo.clear_current_user()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// The account behind the current-user marker, if any
    pub fn current(&self) -> Result<Option<Account>> {
        let Some(email) = self.repo.load_current_user()? else {
            return Ok(None);
        };
        if email == self.admin.email {
            return Ok(Some(Account::Admin(email)));
        }
        Ok(Some(Account::Member(email)))
    }

    fn establish(&mut self, account: Account) -> Result<Account> {
        self.repo.save_current_user(account.email())?;
        tracing::info!("Logged in as {}", account.email());
        Ok(account)
    }
}

fn require_credentials<'e>(email: &'e str, password: &str) -> Result<&'e str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_sign_up_then_log_in() {
        let mut repo = Repository::new(MemoryStore::new());
        let admin = AdminConfig::default();
        let mut accounts = Accounts::new(&mut repo, &admin);

        let account = accounts.sign_up("a@example.com", "pw").unwrap();
        assert_eq!(account, Account::Member("a@example.com".into()));
        assert_eq!(accounts.current().unwrap(), Some(account.clone()));

        accounts.log_out().unwrap();
        assert_eq!(accounts.current().unwrap(), None);

        assert_eq!(accounts.log_in("a@example.com", "pw").unwrap(), account);
    }

    #[test]
    fn test_duplicate_and_reserved_emails_rejected() {
        let mut repo = Repository::new(MemoryStore::new());
        let admin = AdminConfig::default();
        let mut accounts = Accounts::new(&mut repo, &admin);

        accounts.sign_up("a@example.com", "pw").unwrap();
        assert!(matches!(
            accounts.sign_up("a@example.com", "other"),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            accounts.sign_up("admin@admin.com", "x"),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn test_wrong_password_and_blank_input() {
        let mut repo = Repository::new(MemoryStore::new());
        let admin = AdminConfig::default();
        let mut accounts = Accounts::new(&mut repo, &admin);

        accounts.sign_up("a@example.com", "pw").unwrap();
        assert!(matches!(
            accounts.log_in("a@example.com", "nope"),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            accounts.log_in("nobody@example.com", "pw"),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            accounts.log_in("  ", "pw"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_admin_login_is_not_stored_as_member() {
        let mut repo = Repository::new(MemoryStore::new());
        let admin = AdminConfig::default();
        let mut accounts = Accounts::new(&mut repo, &admin);

        let account = accounts.log_in("admin@admin.com", "admin123").unwrap();
        assert!(account.is_admin());
        assert!(accounts.current().unwrap().unwrap().is_admin());

        assert!(repo.load_credentials().unwrap().is_empty());
    }
}
