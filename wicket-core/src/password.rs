//! Password hashing
//!
//! The login path talks to a [`PasswordHasher`] only. Besides hashing and
//! comparing, a hasher owns a decoy hash: a well-formed hash of a secret
//! nobody knows. Comparing against it when the account does not exist costs
//! the same as comparing against a real hash.

use async_trait::async_trait;

use crate::{Error, crypto::generate_secure_token, error::CryptoError};

#[async_trait]
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash a secret for storage
    async fn hash(&self, secret: &str) -> Result<String, Error>;

    /// Compare a secret against a stored hash
    ///
    /// A hash that cannot be parsed compares as `false`.
    async fn matches(&self, secret: &str, hash: &str) -> Result<bool, Error>;

    /// A valid hash no submitted secret will match in practice
    fn decoy_hash(&self) -> &str;
}

#[async_trait]
impl PasswordHasher for Box<dyn PasswordHasher> {
    async fn hash(&self, secret: &str) -> Result<String, Error> {
        (**self).hash(secret).await
    }

    async fn matches(&self, secret: &str, hash: &str) -> Result<bool, Error> {
        (**self).matches(secret, hash).await
    }

    fn decoy_hash(&self) -> &str {
        (**self).decoy_hash()
    }
}

/// Argon2id hashing via `password-auth`, off the async runtime
pub struct Argon2Hasher {
    decoy: String,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            decoy: password_auth::generate_hash(generate_secure_token()),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, secret: &str) -> Result<String, Error> {
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || password_auth::generate_hash(secret))
            .await
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }

    async fn matches(&self, secret: &str, hash: &str) -> Result<bool, Error> {
        let secret = secret.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || password_auth::verify_password(secret, &hash).is_ok())
            .await
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }

    fn decoy_hash(&self) -> &str {
        &self.decoy
    }
}
