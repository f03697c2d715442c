//! Lifecycle orchestration.
//!
//! The orchestrator owns the cross-cutting state of one activation: the
//! tunnel session, the webhook registration, and the callback server task.
//! Startup is strictly sequential (tunnel, then registration, then server)
//! so a callback can never arrive before the secret association exists.
//! Teardown is best-effort: every step is attempted, failures are logged,
//! and the orchestrator always lands in `Inactive`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::github::{self, GithubClient, RegistrationError, WebhookRegistration};
use crate::notify::NotificationSink;
use crate::server::{build_router, AppState, CALLBACK_PATH};
use crate::tunnel::{self, LineSink, TunnelConfig, TunnelError, TunnelSession};

/// How long the callback server gets to drain in-flight requests.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Observable lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inactive,
    Starting,
    Active,
    /// Transient: a startup step failed and unwinding is in progress.
    /// The orchestrator always continues on to `Inactive`.
    Failed,
}

/// Errors from `activate`.
///
/// Each one aborts the whole activation; partial resources are already
/// unwound by the time the error is returned.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// A second `activate` while Starting or Active is rejected outright
    /// rather than silently ignored.
    #[error("an activation is already in flight")]
    AlreadyActive,

    #[error("tunnel startup failed: {0}")]
    Tunnel(#[from] TunnelError),

    #[error("webhook registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("failed to bind callback server on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// The running callback server task and its shutdown trigger.
struct ServerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Sequences tunnel, registration, and callback server through one
/// activation at a time.
///
/// Single-writer by construction: `activate` and `deactivate` take
/// `&mut self`, so the subprocess handle and hook identifier are never
/// mutated concurrently.
pub struct Orchestrator {
    config: Config,
    github: GithubClient,
    sink: Arc<dyn NotificationSink>,
    log: LineSink,

    phase: Phase,
    session: Option<TunnelSession>,
    registration: Option<WebhookRegistration>,
    server: Option<ServerHandle>,
}

impl Orchestrator {
    /// `log` receives tunnel output lines for operator display.
    pub fn new(
        config: Config,
        github: GithubClient,
        sink: Arc<dyn NotificationSink>,
        log: LineSink,
    ) -> Self {
        Orchestrator {
            config,
            github,
            sink,
            log,
            phase: Phase::Inactive,
            session: None,
            registration: None,
            server: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current registration, while Active.
    pub fn registration(&self) -> Option<&WebhookRegistration> {
        self.registration.as_ref()
    }

    /// Brings the whole pipeline up: tunnel, webhook, callback server.
    ///
    /// On any failure the phase passes through `Failed`, everything
    /// already started is torn down, and the orchestrator ends `Inactive`
    /// with the cause returned.
    pub async fn activate(&mut self) -> Result<(), ActivationError> {
        if self.phase != Phase::Inactive {
            return Err(ActivationError::AlreadyActive);
        }
        self.phase = Phase::Starting;
        info!(repo = %self.config.repo, "Activating: starting tunnel");

        let session = match tunnel::start(&self.tunnel_config(), self.log.clone()).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e.into()).await),
        };
        let callback_url = format!("{}{}", session.public_url(), CALLBACK_PATH);
        self.session = Some(session);

        let registration = match github::register(
            &self.github,
            &callback_url,
            &self.config.webhook_secret,
            self.config.hook_events.as_api_list(),
        )
        .await
        {
            Ok(registration) => registration,
            Err(e) => return Err(self.fail(e.into()).await),
        };
        self.registration = Some(registration);

        // The tunnel forwards to localhost, so the server need not be
        // reachable from anywhere else.
        let listener =
            match tokio::net::TcpListener::bind(("127.0.0.1", self.config.local_port)).await {
                Ok(listener) => listener,
                Err(source) => {
                    let err = ActivationError::Bind {
                        port: self.config.local_port,
                        source,
                    };
                    return Err(self.fail(err).await);
                }
            };

        let state = AppState::new(
            self.config.webhook_secret.as_bytes(),
            Arc::clone(&self.sink),
        );
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            let app = build_router(state);
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "Callback server terminated unexpectedly");
            }
        });
        self.server = Some(ServerHandle { shutdown, task });

        self.phase = Phase::Active;
        info!(url = %callback_url, "Active: listening for events");
        Ok(())
    }

    /// Tears everything down, best-effort, and ends `Inactive`.
    ///
    /// Idempotent: deactivating an inactive orchestrator is a no-op.
    pub async fn deactivate(&mut self) {
        info!("Deactivating");
        self.teardown().await;
    }

    /// Marks the activation failed, unwinds, and hands the error back.
    async fn fail(&mut self, err: ActivationError) -> ActivationError {
        self.phase = Phase::Failed;
        error!(error = %err, "Activation failed, unwinding");
        self.teardown().await;
        err
    }

    /// Deletes the webhook, stops the tunnel, shuts the server down.
    /// Every failure is logged and swallowed.
    async fn teardown(&mut self) {
        if let Some(registration) = self.registration.take() {
            if let Err(e) = github::deregister(&self.github, registration.hook_id).await {
                warn!(error = %e, "Failed to delete webhook during teardown");
            }
        }

        if let Some(mut session) = self.session.take() {
            session.stop().await;
        }

        if let Some(server) = self.server.take() {
            server.shutdown.cancel();
            match tokio::time::timeout(SHUTDOWN_GRACE, server.task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Callback server task failed"),
                Err(_) => warn!("Callback server did not stop within grace period"),
            }
        }

        self.phase = Phase::Inactive;
    }

    fn tunnel_config(&self) -> TunnelConfig {
        TunnelConfig {
            binary: self.config.tunnel_binary.clone(),
            local_port: self.config.local_port,
            startup_timeout: self.config.tunnel_timeout,
        }
    }
}
