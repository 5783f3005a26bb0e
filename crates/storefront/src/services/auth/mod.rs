//! Authentication service.
//!
//! Login is a mock: any well-formed email signs in, and an unseen email
//! creates the account. There are no passwords or sessions; the caller keeps
//! the returned user id.

mod error;

pub use error::AuthError;

use tracing::{info, instrument, warn};

use aurelia_core::{Email, User, UserId};

use crate::db::{Db, StoreError, UserRepository};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Log in with an email, creating the user on first sight.
    ///
    /// The email is normalized first, so `Ada@Example.com` and
    /// `ada@example.com` are the same account. Concurrent first logins for
    /// one email create exactly one user: the new user record is written
    /// before the email is claimed, and a caller that loses the claim removes
    /// its own record and returns the winner.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Store` if the store fails.
    #[instrument(skip(self, email))]
    pub async fn login(&self, email: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        if let Some(user) = self.users.find_by_email(&email).await? {
            return Ok(user);
        }

        let candidate = self
            .users
            .create(User::new(UserId::generate(), email.clone()))
            .await?;
        let owner = self.users.claim_email(&email, &candidate.id).await?;
        if owner == candidate.id {
            info!(user_id = %candidate.id, "created user");
            return Ok(candidate);
        }

        if let Err(e) = self.users.delete(&candidate.id).await {
            warn!(user_id = %candidate.id, error = %e, "failed to remove losing user record");
        }
        self.owner_record(owner, email).await
    }

    /// The user record for a claimed email, restored if it has gone missing.
    async fn owner_record(&self, owner: UserId, email: Email) -> Result<User, AuthError> {
        if let Some(user) = self.users.get(&owner).await? {
            return Ok(user);
        }
        warn!(user_id = %owner, "restoring missing user for claimed email");
        match self.users.create(User::new(owner.clone(), email)).await {
            Ok(user) => Ok(user),
            Err(StoreError::AlreadyExists(_)) => self
                .users
                .get(&owner)
                .await?
                .ok_or_else(|| AuthError::Store(StoreError::NotFound(owner.to_string()))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::users::USERS;

    #[tokio::test]
    async fn test_first_login_creates_user() {
        let db = Db::memory();
        let user = AuthService::new(&db).login("ada.lovelace@example.com").await.unwrap();

        assert_eq!(user.email.as_str(), "ada.lovelace@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(USERS.index(&db).len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_login_returns_same_user() {
        let db = Db::memory();
        let auth = AuthService::new(&db);
        let first = auth.login("ada@example.com").await.unwrap();
        let second = auth.login("  ADA@example.com ").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(USERS.index(&db).len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let db = Db::memory();
        let err = AuthService::new(&db).login("not-an-email").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
        assert!(USERS.index(&db).is_empty().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_logins_create_one_user() {
        let db = Db::memory();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    AuthService::new(&db).login("race@example.com").await.unwrap().id
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 1);
        assert_eq!(USERS.index(&db).len().await.unwrap(), 1);
    }
}
