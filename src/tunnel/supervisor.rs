//! Tunnel process lifecycle: spawn, stream, discover, terminate.
//!
//! The supervisor launches the tunnel binary pointed at the local callback
//! port, merges its stdout and stderr into one line stream, and reads lines
//! until an allow-listed public URL appears or the startup timeout elapses.
//! Every line read is forwarded to the caller's line sink for display,
//! before and after discovery.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{TunnelConfig, TunnelError, TunnelSession, UrlScanner};

/// Where tunnel log lines are forwarded for operator display.
///
/// Send failures (receiver dropped) are ignored; display is best-effort.
pub type LineSink = mpsc::UnboundedSender<String>;

/// How long a SIGTERM'd process gets before SIGKILL.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Starts the tunnel and waits for it to advertise a public URL.
///
/// Returns a [`TunnelSession`] owning the subprocess, or an error with the
/// subprocess already killed:
///
/// - [`TunnelError::Launch`] if the binary cannot be spawned,
/// - [`TunnelError::EarlyExit`] if it dies before producing a URL,
/// - [`TunnelError::Timeout`] if `config.startup_timeout` elapses first.
///
/// After discovery, remaining output keeps flowing to `lines` from a
/// background task for as long as the process lives.
pub async fn start(config: &TunnelConfig, lines: LineSink) -> Result<TunnelSession, TunnelError> {
    let target = format!("http://localhost:{}", config.local_port);
    debug!(binary = %config.binary, %target, "Launching tunnel process");

    let mut child = Command::new(&config.binary)
        .args(["tunnel", "--url", &target, "--loglevel", "info"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // If the notifier is killed outright, the OS reaps the tunnel too.
        .kill_on_drop(true)
        .spawn()
        .map_err(TunnelError::Launch)?;

    // Merge stdout and stderr into one channel; each pump task ends when
    // its pipe closes, and the channel closes when both have ended.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump_lines(stderr, tx));
    }

    let deadline = tokio::time::Instant::now() + config.startup_timeout;
    let mut scanner = UrlScanner::new();

    let public_url = loop {
        let line = match tokio::time::timeout_at(deadline, rx.recv()).await {
            Err(_) => {
                warn!(timeout = ?config.startup_timeout, "Tunnel produced no public URL in time");
                terminate(&mut child).await;
                return Err(TunnelError::Timeout(config.startup_timeout));
            }
            // Both pipes closed: the process exited without a URL.
            Ok(None) => {
                terminate(&mut child).await;
                return Err(TunnelError::EarlyExit);
            }
            Ok(Some(line)) => line,
        };

        debug!(line = %line, "tunnel");
        let _ = lines.send(line.clone());

        if let Some(url) = scanner.feed(&line) {
            break url.to_string();
        }
    };

    // Keep the operator display fed after discovery.
    let forward = lines.clone();
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            debug!(line = %line, "tunnel");
            let _ = forward.send(line);
        }
    });

    info!(url = %public_url, "Tunnel ready");
    Ok(TunnelSession::new(child, public_url))
}

/// Reads lines from one pipe into the merged channel.
async fn pump_lines<R>(stream: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Sends SIGTERM, waits briefly, then escalates to SIGKILL.
///
/// Never errors: every failure path is logged and swallowed, and a process
/// that already exited is a no-op.
pub(crate) async fn terminate(child: &mut Child) {
    // Already reaped?
    if matches!(child.try_wait(), Ok(Some(_))) {
        return;
    }

    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
            Ok(_) => return,
            Err(_) => warn!("Tunnel ignored SIGTERM, escalating to SIGKILL"),
        }
    }

    // SIGKILL fallback (and the only path on non-unix platforms).
    let _ = child.start_kill();
    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, "Error reaping tunnel process"),
        Err(_) => warn!("Tunnel process still alive after SIGKILL"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunnel::TunnelState;
    use std::path::{Path, PathBuf};

    /// Writes an executable shell script standing in for the tunnel binary.
    fn fake_tunnel(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-tunnel.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(binary: &Path, timeout: Duration) -> TunnelConfig {
        TunnelConfig {
            binary: binary.to_str().unwrap().to_string(),
            local_port: 5000,
            startup_timeout: timeout,
        }
    }

    #[tokio::test]
    async fn discovers_allow_listed_url_and_forwards_lines() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tunnel(
            dir.path(),
            concat!(
                "echo 'INF starting tunnel'\n",
                "echo 'INF visit https://example.com for docs'\n",
                "echo 'INF +  https://abc123.trycloudflare.com/extra/path  +'\n",
                "sleep 30",
            ),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = start(&config(&script, Duration::from_secs(10)), tx)
            .await
            .unwrap();

        assert_eq!(session.public_url(), "https://abc123.trycloudflare.com");
        assert_eq!(session.state(), TunnelState::Running);

        // All lines up to and including the match were forwarded.
        let mut seen = Vec::new();
        while let Ok(line) = rx.try_recv() {
            seen.push(line);
        }
        assert!(seen.iter().any(|l| l.contains("starting tunnel")));
        assert!(seen.iter().any(|l| l.contains("abc123.trycloudflare.com")));

        session.stop().await;
        assert_eq!(session.state(), TunnelState::Terminated);
    }

    #[tokio::test]
    async fn times_out_when_no_url_appears() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tunnel(dir.path(), "echo 'INF no url here'\nsleep 30");

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = start(&config(&script, Duration::from_millis(300)), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, TunnelError::Timeout(_)));
    }

    #[tokio::test]
    async fn timeout_terminates_the_tunnel_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("tunnel.pid");
        let script = fake_tunnel(
            dir.path(),
            &format!(
                "echo $$ > {}\necho 'INF no url here'\nsleep 30",
                pid_file.display()
            ),
        );

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = start(&config(&script, Duration::from_millis(300)), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, TunnelError::Timeout(_)));

        // The subprocess is reaped before the error returns; signal 0 must
        // find nobody at that pid.
        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let alive = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok();
        assert!(!alive, "tunnel process {pid} survived the timeout");
    }

    #[tokio::test]
    async fn early_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tunnel(dir.path(), "echo 'INF shutting down immediately'");

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = start(&config(&script, Duration::from_secs(10)), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, TunnelError::EarlyExit));
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let config = TunnelConfig {
            binary: "/nonexistent/not-a-tunnel".to_string(),
            local_port: 5000,
            startup_timeout: Duration::from_secs(1),
        };

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = start(&config, tx).await.unwrap_err();

        assert!(matches!(err, TunnelError::Launch(_)));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tunnel(
            dir.path(),
            "echo 'https://idle.trycloudflare.com'\nsleep 30",
        );

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = start(&config(&script, Duration::from_secs(10)), tx)
            .await
            .unwrap();

        session.stop().await;
        session.stop().await; // second stop is a no-op
        assert_eq!(session.state(), TunnelState::Terminated);
    }

    #[tokio::test]
    async fn lines_keep_flowing_after_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tunnel(
            dir.path(),
            concat!(
                "echo 'https://flow.trycloudflare.com'\n",
                "echo 'INF connection registered'\n",
                "sleep 30",
            ),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = start(&config(&script, Duration::from_secs(10)), tx)
            .await
            .unwrap();

        // The post-discovery line arrives via the background forwarder.
        let mut saw_registered = false;
        for _ in 0..50 {
            match rx.try_recv() {
                Ok(line) if line.contains("connection registered") => {
                    saw_registered = true;
                    break;
                }
                Ok(_) => {}
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
        assert!(saw_registered);

        session.stop().await;
    }
}
