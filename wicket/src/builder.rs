//! Builder pattern for constructing Wicket instances
//!
//! This module provides a type-safe builder for creating [`Wicket`] instances
//! with compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use wicket::{ThrottleConfig, WicketBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wicket = WicketBuilder::new()
//!         .with_memory_storage()
//!         .with_session_expiry(Duration::days(1))
//!         .with_throttle(ThrottleConfig::default().with_max_failed_attempts(3))
//!         .build()
//!         .await?;
//!
//!     wicket.health_check().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;
use wicket_core::{Argon2Hasher, PasswordHasher, RepositoryProvider};

use crate::{
    JwtConfig, MemoryRepositoryProvider, SessionConfig, SessionProviderType, ThrottleConfig,
    Wicket,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Wicket instance.
#[derive(Debug, thiserror::Error)]
pub enum WicketBuilderError {
    /// The storage backend failed its health check
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`WicketBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Wicket`] instances.
///
/// Storage must be configured before [`build`](WicketBuilder::build) becomes
/// available.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct WicketBuilder<Storage> {
    storage: Storage,
    session_config: SessionConfig,
    throttle_config: ThrottleConfig,
    hasher: Option<Box<dyn PasswordHasher>>,
}

impl Default for WicketBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl WicketBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Session provider: Opaque (storage-backed)
    /// - Session expiry: 7 days
    /// - Login throttle: 5 failures inside 30 minutes, success does not reset
    /// - Password hashing: Argon2id
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            session_config: SessionConfig::default(),
            throttle_config: ThrottleConfig::default(),
            hasher: None,
        }
    }

    /// Keep everything in process memory.
    pub fn with_memory_storage(self) -> WicketBuilder<WithStorage<MemoryRepositoryProvider>> {
        self.with_repositories(Arc::new(MemoryRepositoryProvider::new()))
    }

    /// Use an existing repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> WicketBuilder<WithStorage<R>> {
        WicketBuilder {
            storage: WithStorage { repositories },
            session_config: self.session_config,
            throttle_config: self.throttle_config,
            hasher: self.hasher,
        }
    }
}

// ============================================================================
// Configuration Methods (available after storage is configured)
// ============================================================================

impl<R: RepositoryProvider> WicketBuilder<WithStorage<R>> {
    /// Set how long a session lives after login.
    pub fn with_session_expiry(mut self, duration: Duration) -> Self {
        self.session_config.expires_in = duration;
        self
    }

    /// Issue JWTs instead of storage-backed opaque tokens.
    pub fn with_jwt_sessions(mut self, config: JwtConfig) -> Self {
        self.session_config.provider_type = SessionProviderType::Jwt(config);
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the login lockout policy.
    pub fn with_throttle(mut self, config: ThrottleConfig) -> Self {
        self.throttle_config = config;
        self
    }

    /// Replace the Argon2 hasher.
    pub fn with_password_hasher(mut self, hasher: impl PasswordHasher) -> Self {
        self.hasher = Some(Box::new(hasher));
        self
    }

    /// Check the configuration and storage, then build the instance.
    pub async fn build(self) -> Result<Wicket<R>, WicketBuilderError> {
        if self.session_config.expires_in <= Duration::zero() {
            return Err(WicketBuilderError::InvalidConfiguration(
                "Session expiry must be positive".to_string(),
            ));
        }
        if self.throttle_config.max_failed_attempts == 0 {
            return Err(WicketBuilderError::InvalidConfiguration(
                "Maximum failed attempts must be at least 1".to_string(),
            ));
        }
        if self.throttle_config.window <= Duration::zero() {
            return Err(WicketBuilderError::InvalidConfiguration(
                "Lockout window must be positive".to_string(),
            ));
        }

        let repositories = self.storage.repositories;
        repositories
            .health_check()
            .await
            .map_err(|e| WicketBuilderError::StorageConnection(e.to_string()))?;

        tracing::debug!(
            max_failed_attempts = self.throttle_config.max_failed_attempts,
            window_minutes = self.throttle_config.window.num_minutes(),
            reset_on_success = self.throttle_config.reset_on_success,
            "Building wicket"
        );

        let hasher = self
            .hasher
            .unwrap_or_else(|| Box::new(Argon2Hasher::new()) as Box<dyn PasswordHasher>);
        Ok(Wicket::assemble(
            repositories,
            self.session_config,
            self.throttle_config,
            hasher,
        ))
    }
}
