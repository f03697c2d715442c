//! HTTP callback server.
//!
//! A small axum app that accepts GitHub webhook deliveries on one fixed
//! path, verifies their signatures, and forwards accepted push events to
//! the notification sink. A `/health` endpoint is provided for liveness
//! checks.
//!
//! The server holds no cross-request mutable state: handlers share only
//! the immutable webhook secret and the sink reference.

use std::sync::Arc;

pub mod handler;
pub mod health;

pub use handler::webhook_handler;
pub use health::health_handler;

use crate::notify::NotificationSink;

/// The fixed path GitHub posts deliveries to.
pub const CALLBACK_PATH: &str = "/github-webhook";

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Secret for HMAC-SHA256 signature verification. Immutable for the
    /// lifetime of one activation.
    secret: Vec<u8>,

    /// Where accepted push events go.
    sink: Arc<dyn NotificationSink>,
}

impl AppState {
    pub fn new(secret: impl Into<Vec<u8>>, sink: Arc<dyn NotificationSink>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                secret: secret.into(),
                sink,
            }),
        }
    }

    /// The webhook secret.
    pub fn secret(&self) -> &[u8] {
        &self.inner.secret
    }

    /// The notification sink.
    pub fn sink(&self) -> &dyn NotificationSink {
        self.inner.sink.as_ref()
    }
}

/// Builds the axum router with the callback and health endpoints.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route(CALLBACK_PATH, post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
