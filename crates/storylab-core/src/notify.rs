//! Transient user-facing messages.
//!
//! Each notification carries its own deadline and disappears once that passes,
//! regardless of what else is on screen. There is no dedup and no queue.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::ids;

/// How long a notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared handle to the process-wide notification list. Clones see the same list.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    active: Arc<Mutex<Vec<Notification>>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(Vec::new())),
            ttl: NOTIFICATION_TTL,
        }
    }

    /// Surface `message` now; it removes itself after the TTL
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let notification = Notification {
            id: ids::next_id(),
            message: message.into(),
            kind,
            expires_at: Instant::now() + self.ttl,
        };
        debug!(kind = ?kind, message = %notification.message, "notification raised");

        let id = notification.id;
        self.lock().push(notification);
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Error)
    }

    /// Notifications still within their lifetime, oldest first
    pub fn visible(&self) -> Vec<Notification> {
        let now = Instant::now();
        self.lock()
            .iter()
            .filter(|n| !n.is_expired(now))
            .cloned()
            .collect()
    }

    /// Drop expired notifications, returning how many went
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut active = self.lock();
        let before = active.len();
        active.retain(|n| !n.is_expired(now));
        before - active.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_ttl() {
        let center = NotificationCenter::new();
        center.success("Story idea saved locally!");
        assert_eq!(center.visible().len(), 1);

        advance(Duration::from_millis(4_999)).await;
        assert_eq!(center.visible().len(), 1);

        advance(Duration::from_millis(1)).await;
        assert!(center.visible().is_empty());
        assert_eq!(center.prune(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_dismiss_independently() {
        let center = NotificationCenter::new();
        center.error("Failed to generate dialogue. Please try again.");

        advance(Duration::from_secs(3)).await;
        center.info("Story idea copied to plot generator!");
        let messages: Vec<String> = center.visible().into_iter().map(|n| n.message).collect();
        assert_eq!(messages.len(), 2);

        advance(Duration::from_secs(2)).await;
        let remaining = center.visible();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind, NotificationKind::Info);

        advance(Duration::from_secs(3)).await;
        assert!(center.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_are_not_merged() {
        let center = NotificationCenter::new();
        center.error("same");
        center.error("same");
        assert_eq!(center.visible().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let center = NotificationCenter::new();
        let handle = center.clone();
        handle.info("hello");
        assert_eq!(center.visible().len(), 1);

        advance(NOTIFICATION_TTL).await;
        assert_eq!(center.prune(), 1);
        assert!(handle.visible().is_empty());
    }
}
