//! Configuration loaded from environment variables.
//!
//! Required:
//! - `GITHUB_OWNER`: repository owner
//! - `GITHUB_REPO`: repository name
//! - `GITHUB_TOKEN`: personal access token with `admin:repo_hook` scope
//! - `GITHUB_WEBHOOK_SECRET`: shared secret for signature verification
//!
//! Optional:
//! - `NOTIFIER_LOCAL_PORT`: callback server port (default: 5000)
//! - `NOTIFIER_TUNNEL_BINARY`: tunnel executable (default: `cloudflared`)
//! - `NOTIFIER_TUNNEL_TIMEOUT_SECS`: seconds to wait for a public URL (default: 30)
//! - `NOTIFIER_HOOK_EVENTS`: `push` (default) or `all`

use std::time::Duration;

use thiserror::Error;

use crate::types::RepoId;

const DEFAULT_LOCAL_PORT: u16 = 5000;
const DEFAULT_TUNNEL_BINARY: &str = "cloudflared";
const DEFAULT_TUNNEL_TIMEOUT_SECS: u64 = 30;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable is set but unparseable.
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which events the registered webhook subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvents {
    /// Subscribe to push events only.
    Push,
    /// Subscribe to all events (`["*"]`). Non-push events are still
    /// acknowledged with 204 by the callback server.
    All,
}

impl HookEvents {
    /// The event list sent to the create-hook API.
    pub fn as_api_list(&self) -> Vec<String> {
        match self {
            HookEvents::Push => vec!["push".to_string()],
            HookEvents::All => vec!["*".to_string()],
        }
    }
}

/// Runtime configuration for the notifier.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository to watch.
    pub repo: RepoId,

    /// GitHub access token used for hook registration.
    pub token: String,

    /// Shared secret GitHub uses to sign callbacks.
    pub webhook_secret: String,

    /// Port the callback server binds on localhost.
    pub local_port: u16,

    /// Tunnel executable name or path.
    pub tunnel_binary: String,

    /// How long to wait for the tunnel to advertise a public URL.
    pub tunnel_timeout: Duration,

    /// Events the webhook subscribes to.
    pub hook_events: HookEvents,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// Exists so tests can supply variables without touching process-global
    /// environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let local_port = match lookup("NOTIFIER_LOCAL_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "NOTIFIER_LOCAL_PORT",
                value,
            })?,
            None => DEFAULT_LOCAL_PORT,
        };

        let tunnel_timeout = match lookup("NOTIFIER_TUNNEL_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                    name: "NOTIFIER_TUNNEL_TIMEOUT_SECS",
                    value,
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TUNNEL_TIMEOUT_SECS),
        };

        let hook_events = match lookup("NOTIFIER_HOOK_EVENTS").as_deref() {
            None | Some("push") => HookEvents::Push,
            Some("all") => HookEvents::All,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NOTIFIER_HOOK_EVENTS",
                    value: other.to_string(),
                });
            }
        };

        Ok(Config {
            repo: RepoId::new(required("GITHUB_OWNER")?, required("GITHUB_REPO")?),
            token: required("GITHUB_TOKEN")?,
            webhook_secret: required("GITHUB_WEBHOOK_SECRET")?,
            local_port,
            tunnel_binary: lookup("NOTIFIER_TUNNEL_BINARY")
                .unwrap_or_else(|| DEFAULT_TUNNEL_BINARY.to_string()),
            tunnel_timeout,
            hook_events,
        })
    }
}
