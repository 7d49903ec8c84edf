//! Throttled login through the Wicket façade

use chrono::Duration;
use wicket::{
    JwtConfig, MemoryRepositoryProvider, ThrottleConfig, Wicket, WicketBuilder, WicketError,
};

const EMAIL: &str = "ayu@example.com";
const PASSWORD: &str = "password123";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn wicket_with(throttle: ThrottleConfig) -> Wicket<MemoryRepositoryProvider> {
    init_tracing();
    let wicket = WicketBuilder::new()
        .with_memory_storage()
        .with_throttle(throttle)
        .build()
        .await
        .unwrap();
    wicket.create_user("Ayu", EMAIL, PASSWORD).await.unwrap();
    wicket
}

async fn wicket() -> Wicket<MemoryRepositoryProvider> {
    wicket_with(ThrottleConfig::default()).await
}

#[tokio::test]
async fn test_login_returns_identity_and_session() {
    let wicket = wicket().await;

    let verdict = wicket
        .login(
            EMAIL,
            PASSWORD,
            Some("curl/8.0".to_string()),
            Some("10.0.0.1".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(verdict.email, EMAIL);
    assert_eq!(verdict.name, "Ayu");

    let session = wicket.get_session(&verdict.token).await.unwrap();
    assert_eq!(session.user_id, verdict.user_id);
    assert_eq!(session.user_agent.as_deref(), Some("curl/8.0"));
    assert_eq!(session.ip_address.as_deref(), Some("10.0.0.1"));
    assert!(session.expires_at - session.created_at <= Duration::days(7));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let wicket = wicket().await;

    let wrong_password = wicket.login(EMAIL, "not-it", None, None).await.unwrap_err();
    let unknown_email = wicket
        .login("nobody@example.com", PASSWORD, None, None)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, WicketError::InvalidCredentials));
    assert!(matches!(unknown_email, WicketError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn test_fifth_failure_locks_the_email() {
    let wicket = wicket().await;

    for _ in 0..4 {
        let err = wicket.login(EMAIL, "not-it", None, None).await.unwrap_err();
        assert!(matches!(err, WicketError::InvalidCredentials));
    }
    let err = wicket.login(EMAIL, "not-it", None, None).await.unwrap_err();
    assert!(matches!(err, WicketError::LockedOut));
    assert!(wicket.is_locked_out(EMAIL));

    // The right password does not get through a lockout
    let err = wicket.login(EMAIL, PASSWORD, None, None).await.unwrap_err();
    assert!(matches!(err, WicketError::LockedOut));
    assert_eq!(err.to_string(), "Too many failed login attempts");
}

#[tokio::test]
async fn test_unlock_lets_the_user_back_in() {
    let wicket = wicket().await;
    for _ in 0..5 {
        let _ = wicket.login(EMAIL, "not-it", None, None).await;
    }
    assert!(wicket.is_locked_out(EMAIL));

    assert!(wicket.unlock(EMAIL));
    assert!(!wicket.is_locked_out(EMAIL));
    assert!(wicket.failed_attempts(EMAIL).is_none());
    wicket.login(EMAIL, PASSWORD, None, None).await.unwrap();
    assert!(!wicket.unlock(EMAIL));
}

#[tokio::test]
async fn test_success_keeps_failure_count_by_default() {
    let wicket = wicket().await;
    for _ in 0..2 {
        let _ = wicket.login(EMAIL, "not-it", None, None).await;
    }

    wicket.login(EMAIL, PASSWORD, None, None).await.unwrap();
    assert_eq!(wicket.failed_attempts(EMAIL).unwrap().failure_count, 2);
}

#[tokio::test]
async fn test_success_resets_failure_count_when_configured() {
    let wicket = wicket_with(ThrottleConfig::default().with_reset_on_success(true)).await;
    for _ in 0..2 {
        let _ = wicket.login(EMAIL, "not-it", None, None).await;
    }

    wicket.login(EMAIL, PASSWORD, None, None).await.unwrap();
    assert!(wicket.failed_attempts(EMAIL).is_none());
}

#[tokio::test]
async fn test_lockouts_are_per_email() {
    let wicket = wicket_with(ThrottleConfig::default().with_max_failed_attempts(2)).await;
    wicket
        .create_user("Budi", "budi@example.com", PASSWORD)
        .await
        .unwrap();

    for _ in 0..2 {
        let _ = wicket.login(EMAIL, "not-it", None, None).await;
    }
    assert!(wicket.is_locked_out(EMAIL));
    wicket
        .login("budi@example.com", PASSWORD, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_logout_revokes_opaque_session() {
    let wicket = wicket().await;
    let verdict = wicket.login(EMAIL, PASSWORD, None, None).await.unwrap();

    wicket.delete_session(&verdict.token).await.unwrap();
    let err = wicket.get_session(&verdict.token).await.unwrap_err();
    assert!(matches!(err, WicketError::SessionError(_)));
}

#[tokio::test]
async fn test_login_with_jwt_sessions() {
    init_tracing();
    let wicket = WicketBuilder::new()
        .with_memory_storage()
        .with_jwt_sessions(
            JwtConfig::new_hs256(b"login-test-secret-key-32-bytes!!".to_vec())
                .with_issuer("wicket-tests"),
        )
        .build()
        .await
        .unwrap();
    wicket.create_user("Ayu", EMAIL, PASSWORD).await.unwrap();

    let verdict = wicket.login(EMAIL, PASSWORD, None, None).await.unwrap();
    assert_eq!(verdict.token.as_str().split('.').count(), 3);

    let session = wicket.get_session(&verdict.token).await.unwrap();
    assert_eq!(session.user_id, verdict.user_id);

    let err = wicket
        .get_session(&"not.a.jwt".into())
        .await
        .unwrap_err();
    assert!(matches!(err, WicketError::SessionError(_)));
}
