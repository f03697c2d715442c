//! Notification dispatch.
//!
//! The callback server hands accepted push events to a [`NotificationSink`].
//! The sink is fire-and-forget: it must not block the request handler and
//! its failures are logged, never propagated.

mod desktop;

pub use desktop::DesktopNotifier;

/// A desktop notification derived from a push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline, e.g. `owner/repo (main)`.
    pub title: String,

    /// Multi-line detail: pusher plus one line per commit message.
    pub body: String,
}

/// One-way sink for notifications.
///
/// Implementations must return promptly; anything slow (spawning the OS
/// notification helper) belongs on a background task.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
pub(crate) mod recording {
    //! Test sink that records notifications instead of displaying them.

    use std::sync::{Arc, Mutex};

    use super::{Notification, NotificationSink};

    #[derive(Clone, Default)]
    pub struct RecordingSink {
        received: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn received(&self) -> Vec<Notification> {
            self.received.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.received.lock().unwrap().push(notification);
        }
    }
}
