use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wicket::{MemoryRepositoryProvider, ThrottleConfig, Wicket, WicketBuilder};
use wicket_axum::CookieConfig;

const EMAIL: &str = "ayu@example.com";
const PASSWORD: &str = "password123";

async fn setup() -> (Router, Arc<Wicket<MemoryRepositoryProvider>>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let wicket = Arc::new(
        WicketBuilder::new()
            .with_memory_storage()
            .with_throttle(ThrottleConfig::default())
            .build()
            .await
            .unwrap(),
    );
    wicket.create_user("Ayu", EMAIL, PASSWORD).await.unwrap();

    let app = wicket_axum::routes(wicket.clone())
        .with_cookie_config(CookieConfig::development())
        .build();
    (app, wicket)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/authentication/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn token(app: &Router) -> String {
    let (status, body) = login(app, EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_success_returns_identity_and_cookie() {
    let (app, _) = setup().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/authentication/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": EMAIL, "password": PASSWORD }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_id="));
    assert!(cookie.contains("HttpOnly"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["email"], EMAIL);
    assert_eq!(body["name"], "Ayu");
    assert!(body["user_id"].as_str().unwrap().starts_with("usr_"));
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failure_does_not_reveal_which_part_was_wrong() {
    let (app, _) = setup().await;

    let (status, wrong_password) = login(&app, EMAIL, "not-it").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, unknown_email) = login(&app, "nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(wrong_password, json!({ "error": "Wrong email or password", "code": 403 }));
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_fifth_failure_is_locked_out() {
    let (app, wicket) = setup().await;

    for _ in 0..4 {
        let (_, body) = login(&app, EMAIL, "not-it").await;
        assert_eq!(body["error"], "Wrong email or password");
    }
    let (status, body) = login(&app, EMAIL, "not-it").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Too many failed login attempts");

    let (status, body) = login(&app, EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Too many failed login attempts");

    wicket.unlock(EMAIL);
    let (status, _) = login(&app, EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_need_a_session() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = send(&app, Method::GET, "/marketplace", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = token(&app).await;
    let (status, body) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let (app, _) = setup().await;
    let token = token(&app).await;

    let request = Request::builder()
        .uri("/marketplace")
        .header(header::COOKIE, format!("session_id={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let (app, _) = setup().await;
    let token = token(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/authentication/logout",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_administration() {
    let (app, _) = setup().await;
    let token = token(&app).await;

    let new_user = json!({
        "name": "Budi",
        "email": "budi@example.com",
        "password": "password456",
        "password_confirm": "password456",
    });
    let (status, budi) = send(&app, Method::POST, "/users", Some(&token), Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(budi["email"], "budi@example.com");
    assert!(budi.get("password").is_none());

    let (status, body) = send(&app, Method::POST, "/users", Some(&token), Some(new_user)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(&token),
        Some(json!({
            "name": "Citra",
            "email": "citra@example.com",
            "password": "password789",
            "password_confirm": "password780",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password confirmation mismatched");

    let id = budi["id"].as_str().unwrap();
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/users/{id}"),
        Some(&token),
        Some(json!({ "name": "Budi S.", "email": "budi@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Budi S.");

    let (status, page) = send(
        &app,
        Method::GET,
        "/users?page_number=1&page_size=1&sort=name:desc",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"][0]["name"], "Budi S.");
    assert_eq!(page["count"], 1);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["has_next_page"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_change_password() {
    let (app, wicket) = setup().await;
    let token = token(&app).await;
    let me = wicket.get_user_by_email(EMAIL).await.unwrap().unwrap();
    let other = wicket
        .create_user("Budi", "budi@example.com", "password456")
        .await
        .unwrap();

    let change = json!({
        "password_old": PASSWORD,
        "password_new": "newpassword1",
        "password_confirm": "newpassword1",
    });

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/{}/change-password", other.id),
        Some(&token),
        Some(change.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/{}/change-password", me.id),
        Some(&token),
        Some(change),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Every session of the user is revoked
    let (status, _) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, EMAIL, "newpassword1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_marketplace() {
    let (app, _) = setup().await;
    let token = token(&app).await;

    let kopi = json!({
        "name": "Kopi Toraja",
        "description": "Single origin",
        "price": 85000,
        "stock": 12,
    });
    let (status, product) = send(
        &app,
        Method::POST,
        "/marketplace/product",
        Some(&token),
        Some(kopi.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = product["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::POST, "/marketplace/product", Some(&token), Some(kopi)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Product name is already registered");

    let (status, body) = send(
        &app,
        Method::POST,
        "/marketplace/product",
        Some(&token),
        Some(json!({ "name": "Teh", "price": 0, "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/marketplace/{id}/update-product"),
        Some(&token),
        Some(json!({ "stock": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 3);
    assert_eq!(updated["price"], 85000);

    let (status, found) = send(&app, Method::GET, "/marketplace?search=toraja", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/marketplace/{id}/delete-product"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/marketplace/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}
