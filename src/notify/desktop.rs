//! OS-level desktop notifications.
//!
//! Shells out to the platform's notification helper: `notify-send` on
//! Linux, `osascript` on macOS. On other platforms the notification is
//! logged only. The helper runs on a blocking task so the request handler
//! never waits on it.

use tracing::{info, warn};

use super::{Notification, NotificationSink};

/// Sink that displays notifications via the platform's helper binary.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        DesktopNotifier
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, notification: Notification) {
        info!(title = %notification.title, "Dispatching desktop notification");

        tokio::task::spawn_blocking(move || {
            if let Err(message) = display(&notification) {
                warn!(
                    title = %notification.title,
                    error = %message,
                    "Failed to display desktop notification"
                );
            }
        });
    }
}

#[cfg(target_os = "linux")]
fn display(notification: &Notification) -> Result<(), String> {
    run_helper(
        std::process::Command::new("notify-send")
            .arg(&notification.title)
            .arg(&notification.body),
    )
}

#[cfg(target_os = "macos")]
fn display(notification: &Notification) -> Result<(), String> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escape_applescript(&notification.body),
        escape_applescript(&notification.title),
    );
    run_helper(std::process::Command::new("osascript").args(["-e", &script]))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn display(notification: &Notification) -> Result<(), String> {
    info!(
        title = %notification.title,
        body = %notification.body,
        "Desktop notifications unsupported on this platform; logging only"
    );
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn run_helper(command: &mut std::process::Command) -> Result<(), String> {
    match command.output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(String::from_utf8_lossy(&output.stderr).into_owned()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(target_os = "macos")]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', r"\\").replace('"', r#"\""#)
}
