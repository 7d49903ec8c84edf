//! Throttled login
//!
//! Combines the [`CredentialVerifier`] with the [`AttemptThrottle`]:
//!
//! 1. A locked-out identifier is still verified, so a lockout costs the same
//!    as a real attempt. A failed comparison is counted; either way the
//!    caller gets `TooManyAttempts`.
//! 2. Otherwise a match returns the verdict. The failure count is left alone
//!    unless [`ThrottleConfig::reset_on_success`](super::ThrottleConfig) is set.
//! 3. A failed comparison is counted before anything is returned. If that
//!    failure reaches the threshold the caller gets `TooManyAttempts`,
//!    otherwise `InvalidCredentials`.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    error::AuthError,
    password::PasswordHasher,
    repositories::AccountLookup,
    services::{AttemptThrottle, ClientInfo, CredentialVerifier, LoginVerdict},
};

pub struct LoginService<A: AccountLookup, H: PasswordHasher> {
    verifier: CredentialVerifier<A, H>,
    throttle: Arc<AttemptThrottle>,
}

impl<A: AccountLookup, H: PasswordHasher> LoginService<A, H> {
    pub fn new(verifier: CredentialVerifier<A, H>, throttle: Arc<AttemptThrottle>) -> Self {
        Self { verifier, throttle }
    }

    pub fn throttle(&self) -> &AttemptThrottle {
        &self.throttle
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginVerdict, Error> {
        self.login_with(identifier, secret, ClientInfo::default())
            .await
    }

    pub async fn login_with(
        &self,
        identifier: &str,
        secret: &str,
        client: ClientInfo,
    ) -> Result<LoginVerdict, Error> {
        if self.throttle.is_locked_out(identifier) {
            let account = self.verifier.authenticate(identifier, secret).await?;
            if account.is_none() {
                self.throttle.record_failure(identifier);
            }
            tracing::info!(identifier, "Rejected login for locked out identifier");
            return Err(AuthError::TooManyAttempts.into());
        }

        if let Some(verdict) = self.verifier.verify_with(identifier, secret, client).await? {
            if self.throttle.config().reset_on_success {
                self.throttle.reset(identifier);
            }
            tracing::debug!(identifier, user_id = %verdict.user_id, "Login succeeded");
            return Ok(verdict);
        }

        let record = self.throttle.record_failure(identifier);
        tracing::warn!(
            identifier,
            failures = record.failure_count,
            "Failed login attempt"
        );

        if self.throttle.locks_out(&record, Utc::now()) {
            tracing::info!(identifier, "Identifier locked out after repeated failures");
            Err(AuthError::TooManyAttempts.into())
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }
}
