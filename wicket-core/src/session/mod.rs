//! Sessions minted for verified users
//!
//! | Field        | Type             | Description                                  |
//! | ------------ | ---------------- | -------------------------------------------- |
//! | `token`      | `SessionToken`   | Bearer token handed to the client.           |
//! | `user_id`    | `UserId`         | The user the session belongs to.             |
//! | `user_agent` | `Option<String>` | User agent of the client that logged in.     |
//! | `ip_address` | `Option<String>` | IP address of the client that logged in.     |
//! | `created_at` | `DateTime`       | When the session was minted.                 |
//! | `updated_at` | `DateTime`       | When the session was last touched.           |
//! | `expires_at` | `DateTime`       | After this instant the token is rejected.    |

pub mod jwt;
pub mod opaque;
pub mod provider;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    crypto::generate_secure_token,
    error::{CryptoError, SessionError, ValidationError},
    user::UserId,
};

pub use jwt::JwtSessionProvider;
pub use opaque::OpaqueSessionProvider;
pub use provider::SessionProvider;

/// Default lifetime of a login session
pub const DEFAULT_SESSION_DAYS: i64 = 7;

/// Either a random opaque token looked up in storage, or a self-contained JWT
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionToken {
    Opaque(String),
    Jwt(String),
}

impl SessionToken {
    /// Classify a raw bearer string. Three dot-separated segments means JWT.
    pub fn new(token: &str) -> Self {
        if token.split('.').count() == 3 {
            SessionToken::Jwt(token.to_string())
        } else {
            SessionToken::Opaque(token.to_string())
        }
    }

    pub fn new_random() -> Self {
        SessionToken::Opaque(generate_secure_token())
    }

    /// Sign `claims` with the secret in `config`.
    pub fn new_jwt(claims: &JwtClaims, config: &JwtConfig) -> Result<Self, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &config.encoding_key())
            .map(SessionToken::Jwt)
            .map_err(|e| CryptoError::JwtSigning(e.to_string()).into())
    }

    /// Check the signature and expiry of a JWT and return its claims.
    pub fn verify_jwt(&self, config: &JwtConfig) -> Result<JwtClaims, Error> {
        let SessionToken::Jwt(token) = self else {
            return Err(SessionError::InvalidToken("Not a JWT token".to_string()).into());
        };

        decode::<JwtClaims>(token, &config.decoding_key(), &config.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired.into(),
                _ => SessionError::InvalidToken(format!("JWT validation failed: {e}")).into(),
            })
    }

    pub fn as_str(&self) -> &str {
        match self {
            SessionToken::Opaque(token) | SessionToken::Jwt(token) => token,
        }
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried inside a session JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// HS256 signing configuration for JWT sessions
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret_key: Vec<u8>,
    pub issuer: Option<String>,
    /// Embed user agent and IP address in the claims
    pub include_metadata: bool,
}

impl JwtConfig {
    pub fn new_hs256(secret_key: impl Into<Vec<u8>>) -> Self {
        Self {
            secret_key: secret_key.into(),
            issuer: None,
            include_metadata: false,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret_key)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret_key)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn to_jwt_claims(&self, config: &JwtConfig) -> JwtClaims {
        let (user_agent, ip_address) = if config.include_metadata {
            (self.user_agent.clone(), self.ip_address.clone())
        } else {
            (None, None)
        };

        JwtClaims {
            sub: self.user_id.to_string(),
            iat: self.created_at.timestamp(),
            exp: self.expires_at.timestamp(),
            iss: config.issuer.clone(),
            user_agent,
            ip_address,
        }
    }

    pub fn from_jwt_claims(token: SessionToken, claims: JwtClaims) -> Self {
        let now = Utc::now();
        let created_at = DateTime::from_timestamp(claims.iat, 0).unwrap_or(now);
        let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(now);

        Self {
            token,
            user_id: UserId::from(claims.sub),
            user_agent: claims.user_agent,
            ip_address: claims.ip_address,
            created_at,
            updated_at: created_at,
            expires_at,
        }
    }
}

#[derive(Default)]
pub struct SessionBuilder {
    token: Option<SessionToken>,
    user_id: Option<UserId>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionBuilder {
    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn build(self) -> Result<Session, Error> {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ok(Session {
            token: self.token.unwrap_or_default(),
            user_id: self.user_id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            created_at,
            updated_at: created_at,
            expires_at: self
                .expires_at
                .unwrap_or(created_at + Duration::days(DEFAULT_SESSION_DAYS)),
        })
    }
}
