//! # Wicket Axum Integration
//!
//! Axum routes and middleware for a [`Wicket`] instance.
//!
//! | Route                                   | Auth | Purpose                         |
//! | --------------------------------------- | ---- | ------------------------------- |
//! | `GET /health`                           | no   | Storage health                  |
//! | `POST /authentication/login`            | no   | Throttled email/password login  |
//! | `POST /authentication/logout`           | yes  | Revoke the current session      |
//! | `GET, POST /users`                      | yes  | Paginated listing, registration |
//! | `GET, PUT, DELETE /users/{id}`          | yes  | User administration             |
//! | `POST /users/{id}/change-password`      | yes  | Change own password             |
//! | `GET /marketplace`                      | yes  | Products, optional `search`     |
//! | `POST /marketplace/product`             | yes  | List a product                  |
//! | `GET /marketplace/{id}`                 | yes  | Product detail                  |
//! | `PUT /marketplace/{id}/update-product`  | yes  | Update price, stock, description|
//! | `DELETE /marketplace/{id}/delete-product` | yes | Remove a product              |
//!
//! Authenticated routes take `Authorization: Bearer <token>` or the session
//! cookie set by login. Errors are JSON: `{"error": "...", "code": 403}`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wicket::WicketBuilder;
//! use wicket_axum::CookieConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wicket = Arc::new(WicketBuilder::new().with_memory_storage().build().await?);
//!
//!     let app = wicket_axum::routes(wicket)
//!         .with_cookie_config(CookieConfig::development())
//!         .build();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{AuthSession, AuthUser, SessionTokenFromRequest};
pub use middleware::{AppState, require_auth};
pub use routes::create_router;
pub use types::{
    ChangePasswordRequest, ConnectionInfo, CookieConfig, CookieSameSite, CreateUserRequest,
    HealthResponse, LoginRequest, MessageResponse, ProductSearch, UpdateUserRequest,
};

use axum::Router;
use std::sync::Arc;
use wicket::Wicket;
use wicket_core::RepositoryProvider;

/// Create the wicket routes for your Axum application.
pub fn routes<R>(wicket: Arc<Wicket<R>>) -> RouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    RouterBuilder {
        wicket,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring the wicket routes
pub struct RouterBuilder<R: RepositoryProvider> {
    wicket: Arc<Wicket<R>>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> RouterBuilder<R> {
    /// Set custom cookie configuration
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.wicket, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<RouterBuilder<R>> for Router {
    fn from(builder: RouterBuilder<R>) -> Self {
        builder.build()
    }
}
