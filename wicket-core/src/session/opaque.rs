//! Stateful sessions keyed by random opaque tokens
//!
//! The provider mints the token; the [`SessionRepository`] decides how it is
//! persisted. The in-memory repository only keeps a SHA256 digest of it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::{
    Error, Session, SessionToken, UserId, error::SessionError,
    repositories::SessionRepository,
};

use super::provider::SessionProvider;

pub struct OpaqueSessionProvider<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> OpaqueSessionProvider<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: SessionRepository> SessionProvider for OpaqueSessionProvider<R> {
    async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        duration: Duration,
    ) -> Result<Session, Error> {
        let now = Utc::now();
        let session = Session::builder()
            .token(SessionToken::new_random())
            .user_id(user_id.clone())
            .user_agent(user_agent)
            .ip_address(ip_address)
            .created_at(now)
            .expires_at(now + duration)
            .build()?;

        self.repository.create(session).await
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session, Error> {
        let session = self
            .repository
            .find_by_token(token)
            .await?
            .ok_or(SessionError::NotFound)?;

        if session.is_expired() {
            tracing::debug!(user_id = %session.user_id, "Dropping expired session");
            self.repository.delete(token).await?;
            return Err(SessionError::Expired.into());
        }

        Ok(session)
    }

    async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete_by_user_id(user_id).await
    }

    async fn cleanup_expired_sessions(&self) -> Result<(), Error> {
        self.repository.cleanup_expired().await
    }
}
