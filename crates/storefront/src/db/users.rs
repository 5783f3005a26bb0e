//! User repository.
//!
//! Users are keyed by a generated id. Email uniqueness is enforced by a
//! second entity, the email lookup, keyed by the normalized address: whoever
//! creates `user-email:{email}` first owns that address.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use aurelia_core::{Email, User, UserId};

use super::entity::{EntityDef, Record};
use super::{Db, StoreError};

impl Record for User {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Maps a normalized email to the user that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLookup {
    pub email: Email,
    pub user_id: UserId,
}

impl Record for EmailLookup {
    fn id(&self) -> &str {
        self.email.as_str()
    }
}

/// User entity registration.
pub static USERS: EntityDef<User> = EntityDef {
    name: "user",
    index_name: "users",
    initial_state: User::default,
    seed: None,
};

/// Email lookup registration.
pub static USER_EMAILS: EntityDef<EmailLookup> = EntityDef {
    name: "user-email",
    index_name: "user-emails",
    initial_state: EmailLookup::default,
    seed: None,
};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    db: &'a Db,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        USERS.entity(self.db, id.as_str()).get().await
    }

    /// Get the user that owns `email`.
    ///
    /// A lookup pointing at a missing user record reads as no user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let Some(lookup) = USER_EMAILS.entity(self.db, email.as_str()).get().await? else {
            return Ok(None);
        };
        let user = self.get(&lookup.user_id).await?;
        if user.is_none() {
            debug!(user_id = %lookup.user_id, "email lookup points at missing user");
        }
        Ok(user)
    }

    /// Claim `email` for `user_id`.
    ///
    /// Returns the id of the user that owns the address afterwards, which is
    /// `user_id` unless another caller claimed it first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn claim_email(&self, email: &Email, user_id: &UserId) -> Result<UserId, StoreError> {
        let lookup = USER_EMAILS.entity(self.db, email.as_str());
        let claim = EmailLookup {
            email: email.clone(),
            user_id: user_id.clone(),
        };
        match lookup.create(claim).await {
            Ok(claim) => Ok(claim.user_id),
            Err(StoreError::AlreadyExists(_)) => Ok(lookup.state().await?.user_id),
            Err(e) => Err(e),
        }
    }

    /// Store a new user record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the id is taken.
    pub async fn create(&self, user: User) -> Result<User, StoreError> {
        USERS.entity(self.db, user.id.to_string()).create(user).await
    }

    /// Delete a user record. The email lookup is left alone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn delete(&self, id: &UserId) -> Result<bool, StoreError> {
        USERS.entity(self.db, id.as_str()).delete().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_find_by_email_follows_lookup() {
        let db = Db::memory();
        let users = UserRepository::new(&db);
        let user = users
            .create(User::new(UserId::new("u1"), email("ada@example.com")))
            .await
            .unwrap();
        users.claim_email(&user.email, &user.id).await.unwrap();

        let found = users.find_by_email(&email("ada@example.com")).await.unwrap();
        assert_eq!(found, Some(user));
        assert!(users.find_by_email(&email("bob@example.com")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_claim_wins() {
        let db = Db::memory();
        let users = UserRepository::new(&db);
        let address = email("ada@example.com");

        let first = users.claim_email(&address, &UserId::new("u1")).await.unwrap();
        let second = users.claim_email(&address, &UserId::new("u2")).await.unwrap();
        assert_eq!(first, UserId::new("u1"));
        assert_eq!(second, UserId::new("u1"));
        assert_eq!(USER_EMAILS.index(&db).len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dangling_lookup_reads_as_none() {
        let db = Db::memory();
        let users = UserRepository::new(&db);
        users
            .claim_email(&email("ghost@example.com"), &UserId::new("missing"))
            .await
            .unwrap();
        assert!(users.find_by_email(&email("ghost@example.com")).await.unwrap().is_none());
    }
}
