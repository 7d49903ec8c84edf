use crate::{Error, User, UserId, user::NewUser};
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a new user. Fails with `AuthError::UserAlreadyExists` when the
    /// email is taken.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Exact match on the login identifier
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// All users, in insertion order
    async fn list(&self) -> Result<Vec<User>, Error>;

    /// Replace a stored user. Fails with `StorageError::NotFound` when the id
    /// is unknown.
    async fn update(&self, user: &User) -> Result<User, Error>;

    async fn delete(&self, id: &UserId) -> Result<(), Error>;
}
