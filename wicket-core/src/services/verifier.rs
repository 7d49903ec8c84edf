//! Credential verification
//!
//! [`CredentialVerifier::verify`] runs exactly one hash comparison per call.
//! When no account exists under the identifier the comparison runs against
//! the hasher's decoy hash, so an unknown identifier takes as long to reject
//! as a wrong password. The verifier knows nothing about throttling; callers
//! combine it with an [`AttemptThrottle`](super::AttemptThrottle).

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserId,
    password::PasswordHasher,
    repositories::{Account, AccountLookup},
    session::{DEFAULT_SESSION_DAYS, SessionProvider, SessionToken},
};

/// What a successful login hands back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginVerdict {
    pub email: String,
    pub name: String,
    pub user_id: UserId,
    pub token: SessionToken,
}

/// Request metadata recorded on the minted session
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

pub struct CredentialVerifier<A: AccountLookup, H: PasswordHasher> {
    accounts: Arc<A>,
    hasher: Arc<H>,
    sessions: Arc<dyn SessionProvider>,
    session_duration: Duration,
}

impl<A: AccountLookup, H: PasswordHasher> CredentialVerifier<A, H> {
    pub fn new(accounts: Arc<A>, hasher: Arc<H>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            accounts,
            hasher,
            sessions,
            session_duration: Duration::days(DEFAULT_SESSION_DAYS),
        }
    }

    pub fn with_session_duration(mut self, session_duration: Duration) -> Self {
        self.session_duration = session_duration;
        self
    }

    /// Run the single comparison without minting a session
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<Account>, Error> {
        let account = self.accounts.find_account(identifier).await?;

        let hash = account
            .as_ref()
            .map_or(self.hasher.decoy_hash(), |account| {
                account.password_hash.as_str()
            });
        let matched = self.hasher.matches(secret, hash).await?;

        Ok(account.filter(|_| matched))
    }

    /// `Ok(None)` when the identifier is unknown or the secret is wrong.
    pub async fn verify(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<LoginVerdict>, Error> {
        self.verify_with(identifier, secret, ClientInfo::default())
            .await
    }

    pub async fn verify_with(
        &self,
        identifier: &str,
        secret: &str,
        client: ClientInfo,
    ) -> Result<Option<LoginVerdict>, Error> {
        let Some(account) = self.authenticate(identifier, secret).await? else {
            return Ok(None);
        };

        let session = self
            .sessions
            .create_session(
                &account.user.id,
                client.user_agent,
                client.ip_address,
                self.session_duration,
            )
            .await?;

        Ok(Some(LoginVerdict {
            email: account.user.email,
            name: account.user.name,
            user_id: account.user.id,
            token: session.token,
        }))
    }
}
