//! Session provider trait
//!
//! Login success hands a user id to a [`SessionProvider`] and gets back a
//! bearer token. Stateless (JWT) and stateful (opaque, storage-backed)
//! providers sit behind the same trait.

use async_trait::async_trait;
use chrono::Duration;

use crate::{Error, Session, SessionToken, UserId};

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Mint a session for `user_id` that expires after `duration`.
    async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        duration: Duration,
    ) -> Result<Session, Error>;

    /// Resolve a bearer token into its session.
    ///
    /// Returns `SessionError::Expired` for stale tokens and
    /// `SessionError::NotFound` / `SessionError::InvalidToken` for unknown ones.
    async fn get_session(&self, token: &SessionToken) -> Result<Session, Error>;

    /// Revoke one session. A no-op for stateless providers.
    async fn delete_session(&self, token: &SessionToken) -> Result<(), Error>;

    /// Revoke every session of a user. A no-op for stateless providers.
    async fn delete_sessions_for_user(&self, user_id: &UserId) -> Result<(), Error>;

    async fn cleanup_expired_sessions(&self) -> Result<(), Error>;
}

#[async_trait]
impl SessionProvider for Box<dyn SessionProvider> {
    async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        duration: Duration,
    ) -> Result<Session, Error> {
        (**self)
            .create_session(user_id, user_agent, ip_address, duration)
            .await
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session, Error> {
        (**self).get_session(token).await
    }

    async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        (**self).delete_session(token).await
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> Result<(), Error> {
        (**self).delete_sessions_for_user(user_id).await
    }

    async fn cleanup_expired_sessions(&self) -> Result<(), Error> {
        (**self).cleanup_expired_sessions().await
    }
}
