//! Storefront users.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// A storefront user. Created on first login with a previously unseen email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

impl User {
    /// A new user whose display name is derived from the email.
    #[must_use]
    pub fn new(id: UserId, email: Email) -> Self {
        let name = email.display_name();
        Self { id, email, name }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_name() {
        let user = User::new(
            UserId::new("u1"),
            Email::parse("alan.turing@example.com").unwrap(),
        );
        assert_eq!(user.name, "Alan Turing");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            serde_json::json!({ "id": "u1", "email": "alan.turing@example.com", "name": "Alan Turing" })
        );
    }
}
