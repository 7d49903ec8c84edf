//! Core domain and services for wicket
//!
//! The heart of this crate is the login path: a [`CredentialVerifier`] that
//! always performs exactly one hash comparison, and an [`AttemptThrottle`]
//! that locks an identifier out after repeated failures inside a sliding
//! window. [`LoginService`] combines the two.
//!
//! Around it sit the user and marketplace services, the repository traits
//! they are written against, and an in-memory storage backend.
//!
//! [`CredentialVerifier`]: services::CredentialVerifier
//! [`AttemptThrottle`]: services::AttemptThrottle
//! [`LoginService`]: services::LoginService
pub mod crypto;
pub mod error;
pub mod id;
pub mod listing;
pub mod password;
pub mod product;
pub mod repositories;
pub mod services;
pub mod session;
pub mod storage;
pub mod user;
pub mod validation;

pub use error::Error;
pub use listing::{ListQuery, Page};
pub use password::{Argon2Hasher, PasswordHasher};
pub use product::{NewProduct, Product, ProductId, ProductUpdate};
pub use repositories::{Account, AccountLookup, RepositoryProvider};
pub use services::{
    AttemptRecord, AttemptThrottle, ClientInfo, CredentialVerifier, LoginService, LoginVerdict,
    MarketplaceService, ThrottleConfig, UserService,
};
pub use session::{
    JwtConfig, JwtSessionProvider, OpaqueSessionProvider, Session, SessionProvider, SessionToken,
};
pub use user::{NewUser, User, UserId};
