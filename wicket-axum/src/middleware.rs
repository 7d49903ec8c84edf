use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use wicket::Wicket;
use wicket_core::RepositoryProvider;

use crate::{error::ApiError, extractors::SessionTokenFromRequest};

pub struct AppState<R: RepositoryProvider> {
    pub wicket: Arc<Wicket<R>>,
}

impl<R: RepositoryProvider> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            wicket: self.wicket.clone(),
        }
    }
}

/// Reject requests without a live session
///
/// On success the [`Session`](wicket::Session) and its
/// [`User`](wicket::User) are stored in the request extensions for the
/// [`AuthSession`](crate::AuthSession) and [`AuthUser`](crate::AuthUser)
/// extractors.
pub async fn require_auth<R>(
    State(state): State<AppState<R>>,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    let session_token = session_token.ok_or(ApiError::Unauthorized)?;

    let session = state
        .wicket
        .get_session(&session_token)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Invalid session");
            ApiError::InvalidSession
        })?;

    let user = match state.wicket.get_user(&session.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(user_id = %session.user_id, "User not found for session");
            return Err(ApiError::InvalidSession);
        }
        Err(e) => return Err(e.into()),
    };

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
