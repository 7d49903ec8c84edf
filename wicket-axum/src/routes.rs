use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use wicket::{ListQuery, NewProduct, ProductId, ProductUpdate, UserId, Wicket};
use wicket_core::RepositoryProvider;

use crate::{
    error::{ApiError, Result},
    extractors::{AuthSession, AuthUser},
    middleware::{AppState, require_auth},
    types::*,
};

pub fn create_router<R>(wicket: Arc<Wicket<R>>, cookie_config: CookieConfig) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AppState { wicket };

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/authentication/login", post(login_handler));

    let protected_routes = Router::new()
        .route("/authentication/logout", post(logout_handler))
        .merge(user_routes())
        .merge(marketplace_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(Extension(cookie_config))
}

fn user_routes<R>() -> Router<AppState<R>>
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route(
            "/users/{id}/change-password",
            post(change_password_handler),
        )
}

fn marketplace_routes<R>() -> Router<AppState<R>>
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/marketplace", get(list_products_handler))
        .route("/marketplace/product", post(create_product_handler))
        .route("/marketplace/{id}", get(get_product_handler))
        .route(
            "/marketplace/{id}/update-product",
            put(update_product_handler),
        )
        .route(
            "/marketplace/{id}/delete-product",
            delete(delete_product_handler),
        )
}

async fn health_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .wicket
        .health_check()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// ============================================================================
// Authentication
// ============================================================================

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    Extension(cookie_config): Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let verdict = state
        .wicket
        .login(
            &payload.email,
            &payload.password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let same_site = match cookie_config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    };

    let cookie = Cookie::build((cookie_config.name, verdict.token.to_string()))
        .path(cookie_config.path)
        .http_only(cookie_config.http_only)
        .secure(cookie_config.secure)
        .same_site(same_site);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(verdict),
    ))
}

async fn logout_handler<R>(
    State(state): State<AppState<R>>,
    Extension(cookie_config): Extension<CookieConfig>,
    AuthSession(session): AuthSession,
    jar: CookieJar,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.wicket.delete_session(&session.token).await?;

    let jar = jar.remove(Cookie::build((cookie_config.name, "")).path(cookie_config.path));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

// ============================================================================
// Users
// ============================================================================

async fn list_users_handler<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    Ok(Json(state.wicket.paginated_users(&query).await?))
}

async fn get_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state
        .wicket
        .get_user(&UserId::new(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

async fn create_user_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if payload.password != payload.password_confirm {
        return Err(ApiError::BadRequest(
            "Password confirmation mismatched".to_string(),
        ));
    }

    let user = state
        .wicket
        .create_user(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state
        .wicket
        .update_user(&UserId::new(&id), &payload.name, &payload.email)
        .await?;

    Ok(Json(user))
}

async fn delete_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.wicket.delete_user(&UserId::new(&id)).await?;

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}

/// Only the signed-in user may change their own password.
async fn change_password_handler<R>(
    State(state): State<AppState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if user.id.as_str() != id {
        return Err(ApiError::Forbidden);
    }

    state
        .wicket
        .change_password(
            &user.id,
            &payload.password_old,
            &payload.password_new,
            &payload.password_confirm,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

// ============================================================================
// Marketplace
// ============================================================================

async fn list_products_handler<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<ProductSearch>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    Ok(Json(
        state
            .wicket
            .list_products(query.search.as_deref())
            .await?,
    ))
}

async fn get_product_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let product = state
        .wicket
        .get_product(&ProductId::new(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

async fn create_product_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let product = state.wicket.create_product(payload).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let product = state
        .wicket
        .update_product(&ProductId::new(&id), payload)
        .await?;

    Ok(Json(product))
}

async fn delete_product_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.wicket.delete_product(&ProductId::new(&id)).await?;

    Ok(Json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}
