//! Repository traits for the data access layer
//!
//! Each `*Repository` trait covers one data domain, each `*RepositoryProvider`
//! hands out one repository, and [`RepositoryProvider`] bundles them for a
//! storage backend. Services depend on the narrowest trait they need; the
//! adapters in [`adapter`] bridge from a full provider to a single repository.

pub mod account;
pub mod adapter;
pub mod password;
pub mod product;
pub mod session;
pub mod user;

pub use account::{Account, AccountLookup, UserAccountLookup};
pub use adapter::{
    PasswordRepositoryAdapter, ProductRepositoryAdapter, SessionRepositoryAdapter,
    UserRepositoryAdapter,
};
pub use password::PasswordRepository;
pub use product::ProductRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    type PasswordRepo: PasswordRepository;

    fn password(&self) -> &Self::PasswordRepo;
}

pub trait ProductRepositoryProvider: Send + Sync + 'static {
    type ProductRepo: ProductRepository;

    fn product(&self) -> &Self::ProductRepo;
}

pub trait SessionRepositoryProvider: Send + Sync + 'static {
    type SessionRepo: SessionRepository;

    fn session(&self) -> &Self::SessionRepo;
}

/// Everything a storage backend must provide to run wicket
///
/// ```rust,ignore
/// use wicket_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl UserRepositoryProvider for MyStorage {
///     type UserRepo = MyUserRepository;
///     fn user(&self) -> &Self::UserRepo { &self.users }
/// }
///
/// // ... the other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn health_check(&self) -> Result<(), Error> { Ok(()) }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + PasswordRepositoryProvider
    + ProductRepositoryProvider
    + SessionRepositoryProvider
{
    async fn health_check(&self) -> Result<(), Error>;
}
