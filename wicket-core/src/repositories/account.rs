//! Account lookup for the login path
//!
//! The credential verifier only needs one capability from storage: given a
//! login identifier, return the user together with its stored password hash.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, User,
    repositories::{PasswordRepository, UserRepository},
};

/// A user paired with the hash their password is checked against
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait AccountLookup: Send + Sync + 'static {
    /// `Ok(None)` when no account can log in under `identifier`. A user with
    /// no password hash set counts as absent.
    async fn find_account(&self, identifier: &str) -> Result<Option<Account>, Error>;
}

/// [`AccountLookup`] over a user repository and a password repository
pub struct UserAccountLookup<U: UserRepository, P: PasswordRepository> {
    users: Arc<U>,
    passwords: Arc<P>,
}

impl<U: UserRepository, P: PasswordRepository> UserAccountLookup<U, P> {
    pub fn new(users: Arc<U>, passwords: Arc<P>) -> Self {
        Self { users, passwords }
    }
}

#[async_trait]
impl<U: UserRepository, P: PasswordRepository> AccountLookup for UserAccountLookup<U, P> {
    async fn find_account(&self, identifier: &str) -> Result<Option<Account>, Error> {
        let Some(user) = self.users.find_by_email(identifier).await? else {
            return Ok(None);
        };

        let password_hash = self.passwords.get_password_hash(&user.id).await?;
        Ok(password_hash.map(|password_hash| Account {
            user,
            password_hash,
        }))
    }
}
