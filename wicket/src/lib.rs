//! # Wicket
//!
//! Wicket is a small accounts and marketplace backend built around a careful
//! login path. Every login attempt costs one password comparison whether or
//! not the account exists, and an identifier that keeps failing is locked out
//! for a while.
//!
//! - User administration with Argon2 password hashes
//! - Marketplace product listings
//! - Opaque (storage-backed) or JWT sessions
//! - Per-identifier login throttling
//!
//! ## Example
//!
//! ```rust,no_run
//! use wicket::WicketBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wicket = WicketBuilder::new().with_memory_storage().build().await?;
//!
//!     wicket.create_user("Ayu", "ayu@example.com", "password123").await?;
//!     let verdict = wicket
//!         .login("ayu@example.com", "password123", None, None)
//!         .await?;
//!     println!("token: {}", verdict.token);
//!
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use chrono::Duration;
use wicket_core::{
    Argon2Hasher, AttemptRecord, AttemptThrottle, ClientInfo, CredentialVerifier, JwtSessionProvider,
    LoginService, MarketplaceService, OpaqueSessionProvider, PasswordHasher, RepositoryProvider,
    SessionProvider, UserService,
    error::{AuthError, SessionError, StorageError},
    repositories::{
        PasswordRepositoryAdapter, ProductRepositoryAdapter, SessionRepositoryAdapter,
        UserAccountLookup, UserRepositoryAdapter,
    },
    session::DEFAULT_SESSION_DAYS,
};

pub mod builder;

pub use builder::{NoStorage, WicketBuilder, WicketBuilderError, WithStorage};

/// Re-export core types from wicket_core
///
/// These types are commonly used when working with the Wicket API.
pub use wicket_core::{
    JwtConfig, ListQuery, LoginVerdict, NewProduct, Page, Product, ProductId, ProductUpdate,
    Session, SessionToken, ThrottleConfig, User, UserId,
    session::JwtClaims,
    storage::MemoryRepositoryProvider,
};

/// Errors that can occur when using Wicket.
///
/// Login failures keep their two outcomes apart: [`WicketError::InvalidCredentials`]
/// never says whether the email exists, and [`WicketError::LockedOut`] never
/// says whether the password was right.
#[derive(Debug, thiserror::Error)]
pub enum WicketError {
    #[error("Wrong email or password")]
    InvalidCredentials,

    #[error("Too many failed login attempts")]
    LockedOut,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),
}

impl From<wicket_core::Error> for WicketError {
    fn from(err: wicket_core::Error) -> Self {
        use wicket_core::Error;

        match err {
            Error::Auth(AuthError::InvalidCredentials) => WicketError::InvalidCredentials,
            Error::Auth(AuthError::TooManyAttempts) => WicketError::LockedOut,
            Error::Auth(AuthError::UserAlreadyExists) => {
                WicketError::Conflict("Email is already registered".into())
            }
            Error::Storage(StorageError::NotFound) => WicketError::NotFound("Record not found".into()),
            Error::Storage(StorageError::Constraint(msg)) => WicketError::Conflict(msg),
            Error::Storage(e) => WicketError::StorageError(e.to_string()),
            Error::Validation(e) => WicketError::ValidationError(e.to_string()),
            Error::Session(e) => WicketError::SessionError(e.to_string()),
            Error::Crypto(e) => WicketError::CryptoError(e.to_string()),
        }
    }
}

impl WicketError {
    /// Name the missing record in a generic not-found error.
    fn not_found_as(self, message: &str) -> Self {
        match self {
            WicketError::NotFound(_) => WicketError::NotFound(message.to_string()),
            other => other,
        }
    }
}

/// The configuration for a session.
///
/// # Example
///
/// ```rust
/// use wicket::SessionConfig;
///
/// let config = SessionConfig::default();
/// assert_eq!(config.expires_in, chrono::Duration::days(7));
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// The duration until the session expires
    pub expires_in: Duration,
    /// Session provider type
    pub provider_type: SessionProviderType,
}

/// Type of session provider to use
#[derive(Clone)]
pub enum SessionProviderType {
    /// Use opaque tokens stored in the repository provider
    Opaque,
    /// Use self-contained JWT tokens
    Jwt(JwtConfig),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::days(DEFAULT_SESSION_DAYS),
            provider_type: SessionProviderType::Opaque,
        }
    }
}

impl SessionConfig {
    /// Switch to JWT sessions
    pub fn with_jwt(mut self, jwt_config: JwtConfig) -> Self {
        self.provider_type = SessionProviderType::Jwt(jwt_config);
        self
    }

    /// Set the session expiration time
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }
}

type Users<R> = UserRepositoryAdapter<R>;
type Passwords<R> = PasswordRepositoryAdapter<R>;
type Hasher = Box<dyn PasswordHasher>;

/// The main coordinator that wires services to storage.
///
/// `Wicket` owns the login throttle, so lockouts last as long as the instance
/// does. Share it behind an `Arc` across request handlers.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use wicket::{MemoryRepositoryProvider, Wicket};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let wicket = Wicket::new(Arc::new(MemoryRepositoryProvider::new()));
///
///     let user = wicket.create_user("Ayu", "ayu@example.com", "password123").await?;
///     assert!(wicket.get_user(&user.id).await?.is_some());
///     Ok(())
/// }
/// ```
pub struct Wicket<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<Users<R>, Passwords<R>, Hasher>>,
    marketplace_service: Arc<MarketplaceService<ProductRepositoryAdapter<R>>>,
    login_service: Arc<LoginService<UserAccountLookup<Users<R>, Passwords<R>>, Hasher>>,
    session_provider: Arc<dyn SessionProvider>,
    session_config: SessionConfig,
}

impl<R: RepositoryProvider> Wicket<R> {
    /// Create a Wicket instance with opaque sessions, the default lockout
    /// policy and Argon2 password hashing.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::assemble(
            repositories,
            SessionConfig::default(),
            ThrottleConfig::default(),
            Box::new(Argon2Hasher::new()),
        )
    }

    pub(crate) fn assemble(
        repositories: Arc<R>,
        session_config: SessionConfig,
        throttle_config: ThrottleConfig,
        hasher: Hasher,
    ) -> Self {
        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let password_repo = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let hasher = Arc::new(hasher);

        let provider: Box<dyn SessionProvider> = match &session_config.provider_type {
            SessionProviderType::Opaque => Box::new(OpaqueSessionProvider::new(Arc::new(
                SessionRepositoryAdapter::new(repositories.clone()),
            ))),
            SessionProviderType::Jwt(jwt_config) => {
                Box::new(JwtSessionProvider::new(jwt_config.clone()))
            }
        };
        let session_provider: Arc<dyn SessionProvider> = Arc::new(provider);

        let verifier = CredentialVerifier::new(
            Arc::new(UserAccountLookup::new(user_repo.clone(), password_repo.clone())),
            hasher.clone(),
            session_provider.clone(),
        )
        .with_session_duration(session_config.expires_in);
        let throttle = Arc::new(AttemptThrottle::new(throttle_config));

        Self {
            user_service: Arc::new(UserService::new(user_repo, password_repo, hasher)),
            marketplace_service: Arc::new(MarketplaceService::new(Arc::new(
                ProductRepositoryAdapter::new(repositories.clone()),
            ))),
            login_service: Arc::new(LoginService::new(verifier, throttle)),
            session_provider,
            session_config,
            repositories,
        }
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    pub fn throttle_config(&self) -> &ThrottleConfig {
        self.login_service.throttle().config()
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), WicketError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| WicketError::StorageError(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    /// Log a user in by email and password
    ///
    /// Returns [`WicketError::LockedOut`] while the email is throttled, even
    /// when the password is right.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<LoginVerdict, WicketError> {
        let client = ClientInfo {
            user_agent,
            ip_address,
        };
        Ok(self.login_service.login_with(email, password, client).await?)
    }

    pub fn is_locked_out(&self, email: &str) -> bool {
        self.login_service.throttle().is_locked_out(email)
    }

    pub fn failed_attempts(&self, email: &str) -> Option<AttemptRecord> {
        self.login_service.throttle().record(email)
    }

    /// Forget an email's failed logins. Returns whether any were recorded.
    pub fn unlock(&self, email: &str) -> bool {
        let unlocked = self.login_service.throttle().reset(email);
        if unlocked {
            tracing::info!(email, "Cleared failed login attempts");
        }
        unlocked
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>, WicketError> {
        Ok(self.user_service.list_users().await?)
    }

    pub async fn paginated_users(&self, query: &ListQuery) -> Result<Page<User>, WicketError> {
        Ok(self.user_service.paginated_users(query).await?)
    }

    /// Get a user by their ID
    ///
    /// Returns `None` when no such user exists.
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, WicketError> {
        Ok(self.user_service.get_user(user_id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, WicketError> {
        Ok(self.user_service.get_user_by_email(email).await?)
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, WicketError> {
        Ok(self.user_service.create_user(name, email, password).await?)
    }

    pub async fn update_user(
        &self,
        user_id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<User, WicketError> {
        self.user_service
            .update_user(user_id, name, email)
            .await
            .map_err(|e| WicketError::from(e).not_found_as("User not found"))
    }

    /// Delete a user along with their password and sessions
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), WicketError> {
        self.user_service
            .delete_user(user_id)
            .await
            .map_err(|e| WicketError::from(e).not_found_as("User not found"))?;
        self.session_provider
            .delete_sessions_for_user(user_id)
            .await?;
        Ok(())
    }

    /// Change a password and revoke the user's sessions
    ///
    /// A wrong `old_password` is reported as [`WicketError::InvalidCredentials`]
    /// but does not count towards the login throttle.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), WicketError> {
        self.user_service
            .change_password(user_id, old_password, new_password, confirm_password)
            .await
            .map_err(|e| WicketError::from(e).not_found_as("User not found"))?;
        self.session_provider
            .delete_sessions_for_user(user_id)
            .await?;
        tracing::info!(%user_id, "Password changed, sessions revoked");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Marketplace
    // ------------------------------------------------------------------

    /// List products, optionally filtered by a case-insensitive pattern on
    /// the name
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, WicketError> {
        Ok(self.marketplace_service.list_products(search).await?)
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, WicketError> {
        Ok(self.marketplace_service.get_product(id).await?)
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, WicketError> {
        Ok(self.marketplace_service.create_product(product).await?)
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, WicketError> {
        self.marketplace_service
            .update_product(id, update)
            .await
            .map_err(|e| WicketError::from(e).not_found_as("Product not found"))
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), WicketError> {
        self.marketplace_service
            .delete_product(id)
            .await
            .map_err(|e| WicketError::from(e).not_found_as("Product not found"))
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Resolve a bearer token into a live session
    pub async fn get_session(&self, token: &SessionToken) -> Result<Session, WicketError> {
        self.session_provider
            .get_session(token)
            .await
            .map_err(|e| match e {
                wicket_core::Error::Session(SessionError::NotFound) => {
                    WicketError::SessionError("Session not found".to_string())
                }
                e => e.into(),
            })
    }

    /// Log out one session
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), WicketError> {
        Ok(self.session_provider.delete_session(token).await?)
    }

    pub async fn delete_sessions_for_user(&self, user_id: &UserId) -> Result<(), WicketError> {
        Ok(self
            .session_provider
            .delete_sessions_for_user(user_id)
            .await?)
    }

    /// Drop expired sessions once
    ///
    /// Expired opaque sessions are otherwise only removed when their token is
    /// presented again. See [`Wicket::start_session_cleanup_task`] to run this
    /// periodically.
    pub async fn cleanup_expired_sessions(&self) -> Result<(), WicketError> {
        Ok(self.session_provider.cleanup_expired_sessions().await?)
    }

    /// Spawn a task that drops expired sessions every `every`
    ///
    /// The first sweep runs immediately. The task stops when `shutdown`
    /// changes or its sender is dropped.
    pub fn start_session_cleanup_task(
        &self,
        every: std::time::Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let session_provider = Arc::clone(&self.session_provider);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(every);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        if let Err(e) = session_provider.cleanup_expired_sessions().await {
                            tracing::warn!(error = %e, "Failed to clean up expired sessions");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down session cleanup task");
                        break;
                    }
                }
            }
        })
    }
}
