//! Callback endpoint handler.
//!
//! Per-request flow: verify the signature first (no parsing, no payload
//! logging before that gate), then dispatch on the event-type header.
//! `ping` gets a pong, `push` becomes a notification, everything else is
//! acknowledged with 204 and dropped. No outcome here can take down the
//! listener.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, info, warn};

use super::AppState;
use crate::webhook::{verify, PushEvent};

/// Header carrying the GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the HMAC-SHA256 signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Handles `POST` deliveries on the callback path.
///
/// Responses:
/// - `200` with `{"msg":"pong"}` for `ping`
/// - `200` empty for an accepted `push`
/// - `204` empty for any other event type
/// - `403` empty when the signature is missing or invalid
/// - `400` when a `push` body is not parseable JSON
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify(state.secret(), &body, signature) {
        warn!("Rejected delivery with missing or invalid signature");
        return StatusCode::FORBIDDEN.into_response();
    }

    // GitHub always sets the event header; if it is somehow absent we treat
    // the delivery as a ping, matching the hook's initial handshake.
    let event_type = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("ping");

    match event_type {
        "ping" => {
            debug!("Answering ping");
            (StatusCode::OK, Json(json!({"msg": "pong"}))).into_response()
        }
        "push" => match serde_json::from_slice::<PushEvent>(&body) {
            Ok(event) => {
                let notification = event.to_notification();
                info!(
                    repo = %event.repo_full_name(),
                    branch = %event.branch(),
                    pusher = %event.pusher_name(),
                    "Accepted push event"
                );
                state.sink().notify(notification);
                StatusCode::OK.into_response()
            }
            Err(e) => {
                warn!(error = %e, "Rejected push event with unparseable body");
                (StatusCode::BAD_REQUEST, "invalid push payload").into_response()
            }
        },
        other => {
            debug!(event_type = other, "Ignoring event type");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
