//! Tunnel subprocess supervision.
//!
//! The notifier has no public address, so it opens an outbound tunnel via
//! an external binary (`cloudflared` by default) and scrapes the process
//! log stream for the temporary public HTTPS endpoint the relay assigns.
//!
//! - `scan`: extracts the first allow-listed public URL from log lines.
//! - `supervisor`: spawns the process, streams its output, and terminates it.

pub mod scan;
pub mod supervisor;

use std::time::Duration;

use thiserror::Error;
use tokio::process::Child;

pub use scan::UrlScanner;
pub use supervisor::{start, LineSink};

/// Errors from tunnel startup.
///
/// A failed start never yields a [`TunnelSession`]; the subprocess is
/// killed before the error is returned, so no orphan survives.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The tunnel binary could not be spawned at all.
    #[error("failed to launch tunnel process: {0}")]
    Launch(#[source] std::io::Error),

    /// The process exited before advertising a usable public URL.
    #[error("tunnel process exited before advertising a public URL")]
    EarlyExit,

    /// No allow-listed URL appeared within the startup timeout.
    #[error("timed out after {0:?} waiting for a public tunnel URL")]
    Timeout(Duration),
}

/// How to launch the tunnel.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    /// Executable name or path (default: `cloudflared`).
    pub binary: String,

    /// Local port the tunnel forwards to.
    pub local_port: u16,

    /// How long to wait for the public URL before giving up.
    pub startup_timeout: Duration,
}

/// Whether the supervised process is still ours to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Running,
    Terminated,
}

/// A live tunnel: the subprocess handle plus the public URL it advertised.
///
/// Exclusively owned by the orchestrator. The URL is set exactly once, at
/// discovery, and never replaced for the lifetime of the session.
#[derive(Debug)]
pub struct TunnelSession {
    pub(crate) child: Child,
    public_url: String,
    state: TunnelState,
}

impl TunnelSession {
    pub(crate) fn new(child: Child, public_url: String) -> Self {
        TunnelSession {
            child,
            public_url,
            state: TunnelState::Running,
        }
    }

    /// The discovered public HTTPS endpoint, scheme and host only.
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn state(&self) -> TunnelState {
        self.state
    }

    /// Terminates the tunnel process.
    ///
    /// Sends SIGTERM first and escalates to SIGKILL if the process lingers.
    /// Idempotent: stopping an already-stopped session is a no-op, and
    /// termination failures are logged, never surfaced.
    pub async fn stop(&mut self) {
        if self.state != TunnelState::Running {
            return;
        }
        supervisor::terminate(&mut self.child).await;
        self.state = TunnelState::Terminated;
    }
}
