//! Contact relay for the portfolio site.
//!
//! # Pipeline
//!
//! One POST, one linear pass, no branching back:
//!
//! 1. **Authorize method**: anything but POST gets a plain 403
//! 2. **Reserve quota**: at most 3 accepted submissions per session per hour,
//!    taken atomically so parallel requests cannot overshoot
//! 3. **Sanitize**: trim, strip escapes, entity-encode
//! 4. **Validate**: the shared ruleset from the `contact` crate, every violation reported
//! 5. **Spam screen**: fixed denylist, one hit rejects without saying which
//! 6. **Compose**: fixed HTML template, reply-to set to the submitter
//! 7. **Dispatch**: one attempt through the host mail transport
//! 8. **Settle**: any failure gives the reserved slot back
//! 9. **Respond**: `{ success, message }` as JSON
//!
//! | Status | Meaning |
//! |--------|---------|
//! | 200 | sent |
//! | 400 | malformed or oversized body, failed validation or spam |
//! | 403 | not a POST |
//! | 429 | session quota exhausted, `Retry-After` set |
//! | 500 | mail transport failed, quota untouched |
//!
//! # Sessions
//!
//! The quota is keyed by a `portfolio_session` cookie holding a UUID. Requests
//! without one get a fresh id back in `Set-Cookie`. Timestamps live in memory by
//! default, or in Redis when `REDIS_URL` is set so several relays share them.
//!
//! # Setup
//!
//! Run the relay.
//! ```sh
//! RUST_LOG=info CONTACT_TO_EMAIL=me@example.com cargo run -p portfolio
//! ```
//!
//! Try it.
//! ```sh
//! cargo run -p client --bin contact -- --name Jo --email jo@x.com --subject 'Hi!' --message 'Loved your portfolio work'
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION},
    },
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod limiter;
pub mod mail;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod template;
pub mod utils;

use routes::{contact_handler, forbidden_handler, rules_handler};
use state::State;

const BODY_LIMIT: usize = 16 * 1024;

pub async fn start_server() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    // The session cookie only travels cross-origin to an exact origin.
    let cors = match &state.config.allowed_origin {
        Some(origin) => cors
            .allow_origin(AllowOrigin::exact(origin.clone()))
            .allow_credentials(true),
        None => cors.allow_origin(AllowOrigin::any()),
    };

    Router::new()
        .route("/send", post(contact_handler).fallback(forbidden_handler))
        .route("/rules", get(rules_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
