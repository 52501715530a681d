//! Fire-and-forget feedback emitted after store mutations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the notification channel. Slow subscribers lose the oldest entries.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A user-facing message about the outcome of a mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Broadcasts notifications to whoever is listening.
///
/// Delivery is best-effort: with no subscribers the message is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NotificationKind::Success, message.into());
    }

    pub fn failure(&self, message: impl Into<String>) {
        self.send(NotificationKind::Failure, message.into());
    }

    fn send(&self, kind: NotificationKind, message: String) {
        let notification = Notification {
            kind,
            message,
            created_at: Utc::now(),
        };
        // Err only means nobody is subscribed
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
