//! Stateless sessions carried entirely inside a signed JWT

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::{Error, JwtConfig, Session, SessionToken, UserId};

use super::provider::SessionProvider;

pub struct JwtSessionProvider {
    config: JwtConfig,
}

impl JwtSessionProvider {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        duration: Duration,
    ) -> Result<Session, Error> {
        let now = Utc::now();
        let session = Session::builder()
            .user_id(user_id.clone())
            .user_agent(user_agent)
            .ip_address(ip_address)
            .created_at(now)
            .expires_at(now + duration)
            .build()?;

        let token = SessionToken::new_jwt(&session.to_jwt_claims(&self.config), &self.config)?;

        Ok(Session { token, ..session })
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session, Error> {
        let claims = token.verify_jwt(&self.config)?;
        Ok(Session::from_jwt_claims(token.clone(), claims))
    }

    async fn delete_session(&self, _token: &SessionToken) -> Result<(), Error> {
        Ok(())
    }

    async fn delete_sessions_for_user(&self, _user_id: &UserId) -> Result<(), Error> {
        tracing::warn!(
            "JWT sessions cannot be revoked per user; issued tokens stay valid until they expire"
        );
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> Result<(), Error> {
        Ok(())
    }
}
