//! Webhook registration against the repository hooks API.
//!
//! `register` creates a hook pointing GitHub at the tunnel's public URL,
//! carrying the shared secret so callbacks arrive signed. `deregister`
//! deletes it on shutdown and treats an already-deleted hook as success,
//! since removal is best-effort cleanup.
//!
//! Both calls are synchronous single attempts. Retry, if any, happens by
//! the operator re-activating.

use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{GithubClient, RegistrationError};
use crate::types::{HookId, RepoId};

/// A webhook created on GitHub for one activation.
///
/// Invariant: `callback_url` equals the tunnel session's discovered URL
/// (plus the callback path) at creation time. A stale registration is
/// deleted before a new tunnel's URL is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRegistration {
    /// Repository the hook was created on.
    pub repo: RepoId,

    /// Identifier GitHub assigned, needed for deletion.
    pub hook_id: HookId,

    /// Where GitHub delivers events.
    pub callback_url: String,
}

/// Create-hook request body, per the REST hooks API.
#[derive(Debug, Serialize)]
struct CreateHookRequest {
    name: &'static str,
    active: bool,
    events: Vec<String>,
    config: HookTarget,
}

#[derive(Debug, Serialize)]
struct HookTarget {
    url: String,
    content_type: &'static str,
    secret: String,
    insecure_ssl: &'static str,
}

/// The slice of the create-hook response we need.
#[derive(Debug, Deserialize)]
struct CreatedHook {
    id: HookId,
}

/// Creates a webhook delivering JSON payloads to `callback_url`.
///
/// `events` comes from configuration (`["push"]` or `["*"]`). Any
/// non-success status becomes a [`RegistrationError`] carrying GitHub's
/// message.
pub async fn register(
    client: &GithubClient,
    callback_url: &str,
    secret: &str,
    events: Vec<String>,
) -> Result<WebhookRegistration, RegistrationError> {
    let body = CreateHookRequest {
        name: "web",
        active: true,
        events,
        config: HookTarget {
            url: callback_url.to_string(),
            content_type: "json",
            secret: secret.to_string(),
            insecure_ssl: "0",
        },
    };

    let created: CreatedHook = client
        .inner()
        .post(client.hooks_route(), Some(&body))
        .await
        .map_err(RegistrationError::from_octocrab)?;

    info!(
        repo = %client.repo(),
        hook_id = %created.id,
        url = %callback_url,
        "Webhook registered"
    );

    Ok(WebhookRegistration {
        repo: client.repo().clone(),
        hook_id: created.id,
        callback_url: callback_url.to_string(),
    })
}

/// Deletes a registered webhook.
///
/// A 404 means the hook is already gone and counts as success. Other
/// non-success statuses surface as [`RegistrationError`] with the response
/// body preserved for diagnostics.
pub async fn deregister(
    client: &GithubClient,
    hook_id: HookId,
) -> Result<(), RegistrationError> {
    let response = client
        .inner()
        ._delete(client.hook_route(hook_id), None::<&()>)
        .await
        .map_err(RegistrationError::from_octocrab)?;

    let status = response.status().as_u16();
    if deletion_succeeded(status) {
        if status == 404 {
            debug!(repo = %client.repo(), %hook_id, "Webhook already removed remotely");
        } else {
            info!(repo = %client.repo(), %hook_id, "Webhook deleted");
        }
        return Ok(());
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    Err(RegistrationError::from_response(
        status,
        String::from_utf8_lossy(&body).into_owned(),
    ))
}

/// 2xx deletes the hook; 404 means it was already gone. Both are fine.
fn deletion_succeeded(status: u16) -> bool {
    (200..300).contains(&status) || status == 404
}
