//! User accounts
//!
//! | Field        | Type       | Description                                   |
//! | ------------ | ---------- | --------------------------------------------- |
//! | `id`         | `UserId`   | Opaque prefixed identifier (`usr_…`).         |
//! | `name`       | `String`   | Display name.                                 |
//! | `email`      | `String`   | Login identifier, unique across all users.    |
//! | `created_at` | `DateTime` | The timestamp when the user was created.      |
//! | `updated_at` | `DateTime` | The timestamp when the user was last updated. |
//!
//! Password hashes never live on [`User`]; they are kept by the
//! [`PasswordRepository`](crate::repositories::PasswordRepository) and only
//! surface to the login path inside an [`Account`](crate::repositories::Account).
use crate::{
    Error,
    error::utilities::RequiredFieldExt,
    id::{generate_prefixed_id, validate_prefixed_id},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a specific user
/// This value should be treated as opaque
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be inserted into storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn builder() -> NewUserBuilder {
        NewUserBuilder::default()
    }

    /// Materialise the stored record, stamping both timestamps with `now`.
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Default)]
pub struct NewUserBuilder {
    id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
}

impl NewUserBuilder {
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn build(self) -> Result<NewUser, Error> {
        Ok(NewUser {
            id: self.id.unwrap_or_default(),
            name: self.name.require_field("Name")?,
            email: self.email.require_field("Email")?,
        })
    }
}
