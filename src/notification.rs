//! Success and error signals surfaced to whoever is driving the synchronizer.
//!
//! Notifications are delivered over an unbounded channel so mutations never
//! block on a slow listener. Dropping the receiver silently disables
//! notifications rather than failing mutations.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Notification kinds for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// A mutation completed successfully.
    Success,
    /// A mutation failed and was rolled back.
    Error,
}

/// A user-visible signal about the outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Whether this signals a success or a failure.
    pub level: NotificationLevel,
    /// A short heading, e.g. "Success".
    pub title: String,
    /// The human-readable details.
    pub message: String,
}

impl Notification {
    /// Create a new success notification.
    pub fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }

    /// Create a new error notification.
    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// The sending half of the notification channel, held by the synchronizer.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver that consumes its notifications.
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Send `notification` to the listener, if one is still attached.
    pub fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("notification dropped: no listener attached");
        }
    }
}
