//! Login and session checks.
//!
//! Logging in is two explicit steps: [`AuthService::check_credentials`]
//! verifies the password and reports whether the stored hash is outdated,
//! then [`AuthService::upgrade_hash`] re-hashes and persists it.
//! [`AuthService::verify_login`] runs both.

use gallery_shared::{CredentialVerifier, TokenService};
use gallery_store::NewUser;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::images::{lock_db, SharedDatabase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Unknown user or wrong password. The two are never told apart.
    Rejected,
    Authenticated { needs_rehash: bool },
}

#[derive(Clone)]
pub struct AuthService {
    db: SharedDatabase,
    verifier: CredentialVerifier,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(db: SharedDatabase, verifier: CredentialVerifier, tokens: TokenService) -> Self {
        Self {
            db,
            verifier,
            tokens,
        }
    }

    pub fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, ServerError> {
        let user = lock_db(&self.db)?.find_user_by_username(username)?;

        let Some(user) = user else {
            debug!(username, "Login for unknown user");
            return Ok(LoginOutcome::Rejected);
        };

        if !self.verifier.verify(&user.password_hash, password) {
            debug!(username, "Login with wrong password");
            return Ok(LoginOutcome::Rejected);
        }

        Ok(LoginOutcome::Authenticated {
            needs_rehash: self.verifier.needs_rehash(&user.password_hash),
        })
    }

    /// Re-hash `password` with the current parameters and store it.
    ///
    /// Callers must have verified the password first.
    pub fn upgrade_hash(&self, username: &str, password: &str) -> Result<(), ServerError> {
        let hash = self
            .verifier
            .hash(password)
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        let db = lock_db(&self.db)?;
        let user = db
            .find_user_by_username(username)?
            .ok_or(ServerError::InvalidCredentials)?;
        db.update_password_hash(user.id, &hash)?;

        info!(username, "Upgraded password hash");
        Ok(())
    }

    /// `true` when the credentials are valid. Outdated hashes are upgraded
    /// on the way.
    pub fn verify_login(&self, username: &str, password: &str) -> Result<bool, ServerError> {
        match self.check_credentials(username, password)? {
            LoginOutcome::Rejected => Ok(false),
            LoginOutcome::Authenticated { needs_rehash } => {
                if needs_rehash {
                    self.upgrade_hash(username, password)?;
                }
                Ok(true)
            }
        }
    }

    pub fn issue_session(&self, username: &str) -> String {
        self.tokens.issue(username)
    }

    /// Username behind a session token, `None` for anything invalid or expired.
    pub fn resolve_session(&self, token: &str) -> Option<String> {
        self.tokens.validate(token)
    }

    /// Create the administrator account unless a user with that name exists.
    /// Returns `true` when an account was created.
    pub fn provision_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, ServerError> {
        if lock_db(&self.db)?.find_user_by_username(username)?.is_some() {
            debug!(username, "Admin account already present");
            return Ok(false);
        }

        let password_hash = self
            .verifier
            .hash(password)
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        lock_db(&self.db)?.create_user(&NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })?;

        info!(username, "Provisioned admin account");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_store::Database;
    use std::sync::{Arc, Mutex};

    fn cheap_verifier() -> CredentialVerifier {
        CredentialVerifier::with_params(8, 1, 1, None).unwrap()
    }

    fn service_with(verifier: CredentialVerifier) -> (AuthService, SharedDatabase) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let service = AuthService::new(
            db.clone(),
            verifier,
            TokenService::new("test-secret", "test-salt"),
        );
        (service, db)
    }

    #[test]
    fn test_login_success_and_failure() {
        let (auth, _db) = service_with(cheap_verifier());
        assert!(auth.provision_admin("admin", "admin@example.com", "hunter2").unwrap());

        assert!(auth.verify_login("admin", "hunter2").unwrap());
        assert!(!auth.verify_login("admin", "wrong").unwrap());
        assert!(!auth.verify_login("nobody", "hunter2").unwrap());
        assert_eq!(
            auth.check_credentials("nobody", "hunter2").unwrap(),
            auth.check_credentials("admin", "wrong").unwrap()
        );
    }

    #[test]
    fn test_provision_is_idempotent() {
        let (auth, db) = service_with(cheap_verifier());
        assert!(auth.provision_admin("admin", "admin@example.com", "first").unwrap());
        assert!(!auth.provision_admin("admin", "admin@example.com", "second").unwrap());

        assert!(auth.verify_login("admin", "first").unwrap());
        assert!(!auth.verify_login("admin", "second").unwrap());
        assert!(db.lock().unwrap().find_user_by_username("admin").unwrap().is_some());
    }

    #[test]
    fn test_stale_hash_is_upgraded_and_login_still_works() {
        let stale = CredentialVerifier::with_params(16, 2, 1, None).unwrap();
        let (old_auth, db) = service_with(stale);
        old_auth
            .provision_admin("admin", "admin@example.com", "hunter2")
            .unwrap();
        let old_hash = db
            .lock()
            .unwrap()
            .find_user_by_username("admin")
            .unwrap()
            .unwrap()
            .password_hash;

        let auth = AuthService::new(
            db.clone(),
            cheap_verifier(),
            TokenService::new("test-secret", "test-salt"),
        );
        assert_eq!(
            auth.check_credentials("admin", "hunter2").unwrap(),
            LoginOutcome::Authenticated { needs_rehash: true }
        );

        assert!(auth.verify_login("admin", "hunter2").unwrap());
        let new_hash = db
            .lock()
            .unwrap()
            .find_user_by_username("admin")
            .unwrap()
            .unwrap()
            .password_hash;
        assert_ne!(new_hash, old_hash);

        assert_eq!(
            auth.check_credentials("admin", "hunter2").unwrap(),
            LoginOutcome::Authenticated { needs_rehash: false }
        );
        assert!(auth.verify_login("admin", "hunter2").unwrap());
    }

    #[test]
    fn test_session_roundtrip() {
        let (auth, _db) = service_with(cheap_verifier());
        let token = auth.issue_session("admin");

        assert_eq!(auth.resolve_session(&token).as_deref(), Some("admin"));
        assert_eq!(auth.resolve_session("garbage"), None);

        let other = AuthService::new(
            Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
            cheap_verifier(),
            TokenService::new("other-secret", "test-salt"),
        );
        assert_eq!(other.resolve_session(&token), None);
    }
}
