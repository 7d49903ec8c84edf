use std::{net::SocketAddr, sync::Arc};

use chrono::Duration;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wicket::{JwtConfig, ThrottleConfig, WicketBuilder};
use wicket_axum::CookieConfig;

/// Accounts and marketplace API with throttled logins
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "WICKET_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Sign sessions as HS256 JWTs with this secret instead of storing opaque tokens
    #[arg(long, env = "WICKET_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Session lifetime in days
    #[arg(long, env = "WICKET_SESSION_DAYS", default_value_t = 7)]
    session_days: i64,

    /// Failed logins inside the window that lock an email out
    #[arg(long, env = "WICKET_MAX_FAILED_ATTEMPTS", default_value_t = 5)]
    max_failed_attempts: u32,

    /// Minutes a lockout lasts after the last failure
    #[arg(long, env = "WICKET_LOCKOUT_WINDOW_MINUTES", default_value_t = 30)]
    lockout_window_minutes: i64,

    /// Forget earlier failures when a login succeeds
    #[arg(long, env = "WICKET_RESET_ON_SUCCESS")]
    reset_on_success: bool,

    /// Email of an account created at startup, so the API can be logged into
    #[arg(long, env = "WICKET_ADMIN_EMAIL", requires = "admin_password")]
    admin_email: Option<String>,

    #[arg(long, env = "WICKET_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Minutes between sweeps that drop expired sessions
    #[arg(long, env = "WICKET_SESSION_CLEANUP_MINUTES", default_value_t = 60)]
    session_cleanup_minutes: u64,

    /// Send the session cookie over plain HTTP too
    #[arg(long, env = "WICKET_INSECURE_COOKIES")]
    insecure_cookies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log level comes from RUST_LOG, e.g. RUST_LOG=wicket=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let throttle = ThrottleConfig::default()
        .with_max_failed_attempts(cli.max_failed_attempts)
        .with_window(Duration::minutes(cli.lockout_window_minutes))
        .with_reset_on_success(cli.reset_on_success);

    let mut builder = WicketBuilder::new()
        .with_memory_storage()
        .with_session_expiry(Duration::days(cli.session_days))
        .with_throttle(throttle);
    if let Some(secret) = cli.jwt_secret {
        builder = builder.with_jwt_sessions(JwtConfig::new_hs256(secret));
    }
    let wicket = Arc::new(builder.build().await?);

    if let (Some(email), Some(password)) = (&cli.admin_email, &cli.admin_password) {
        let admin = wicket.create_user("Admin", email, password).await?;
        tracing::info!(user_id = %admin.id, email = %admin.email, "Created admin account");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let cleanup = wicket.start_session_cleanup_task(
        std::time::Duration::from_secs(cli.session_cleanup_minutes.max(1) * 60),
        shutdown_rx,
    );

    let cookie_config = if cli.insecure_cookies {
        CookieConfig::development()
    } else {
        CookieConfig::default()
    };
    let app = wicket_axum::routes(wicket)
        .with_cookie_config(cookie_config)
        .build();

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(
        address = %cli.bind,
        max_failed_attempts = cli.max_failed_attempts,
        lockout_window_minutes = cli.lockout_window_minutes,
        "Listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    let _ = shutdown_tx.send(true);
    cleanup.await?;

    Ok(())
}
