//! Foreground notification shown while a hotspot session is live.
//!
//! The notification is driven purely by the tether state stream:
//! [`spawn_notification_bridge`] posts it on `true` and cancels it on
//! `false`. Rendering is delegated to a [`NotificationSurface`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::publisher::TetherStateWatch;

/// Fixed id of the hotspot notification.
pub const NOTIFICATION_ID: i32 = 12345;

/// Id of the channel the notification is posted on.
pub const CHANNEL_ID: &str = "17";

/// Display settings for the hotspot notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// User-visible channel name.
    pub channel_name: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub message: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channel_name: "Local hotspot".to_string(),
            title: "Hotspot active".to_string(),
            message: "A local-only hotspot is running".to_string(),
        }
    }
}

/// Notification importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Standard importance.
    Default,
    /// Shown prominently.
    High,
}

/// A notification as handed to a [`NotificationSurface`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id, used to cancel it.
    pub id: i32,
    /// Channel id.
    pub channel_id: String,
    /// Channel display name.
    pub channel_name: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Ongoing notifications cannot be swiped away.
    pub ongoing: bool,
    /// Importance.
    pub priority: Priority,
}

impl Notification {
    /// Hotspot notification with the given title and message.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_settings(&NotificationSettings {
            title: title.into(),
            message: message.into(),
            ..NotificationSettings::default()
        })
    }

    /// Hotspot notification described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        Self {
            id: NOTIFICATION_ID,
            channel_id: CHANNEL_ID.to_string(),
            channel_name: settings.channel_name.clone(),
            title: settings.title.clone(),
            message: settings.message.clone(),
            ongoing: true,
            priority: Priority::High,
        }
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::from_settings(&NotificationSettings::default())
    }
}

/// Somewhere notifications can be shown.
pub trait NotificationSurface: Send + Sync + 'static {
    /// Show or replace `notification`.
    fn post(&self, notification: &Notification);

    /// Remove the notification with `id`.
    fn cancel(&self, id: i32);
}

/// Surface that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSurface;

impl NotificationSurface for LogNotificationSurface {
    fn post(&self, notification: &Notification) {
        info!(
            id = notification.id,
            channel = %notification.channel_id,
            title = %notification.title,
            "Notification posted: {}",
            notification.message
        );
    }

    fn cancel(&self, id: i32) {
        info!(id, "Notification cancelled");
    }
}

/// Mirror the tether state onto `surface` until the controller shuts down.
///
/// The notification is cancelled when the stream ends while it is shown.
pub fn spawn_notification_bridge(
    watch: &TetherStateWatch,
    surface: Arc<dyn NotificationSurface>,
    notification: Notification,
) -> JoinHandle<()> {
    let mut states = watch.subscribe();
    tokio::spawn(async move {
        let mut shown = false;
        while let Some(active) = states.recv().await {
            match (active, shown) {
                (true, false) => surface.post(&notification),
                (false, true) => surface.cancel(notification.id),
                _ => continue,
            }
            shown = active;
        }
        if shown {
            surface.cancel(notification.id);
        }
        debug!("Notification bridge stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::publisher::StatePublisher;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingSurface {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl NotificationSurface for RecordingSurface {
        fn post(&self, notification: &Notification) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("post:{}", notification.id));
        }

        fn cancel(&self, id: i32) {
            self.calls.lock().unwrap().push(format!("cancel:{id}"));
        }
    }

    #[test]
    fn test_notification_defaults() {
        let notification = Notification::new("Title", "Body");
        assert_eq!(notification.id, 12345);
        assert_eq!(notification.channel_id, "17");
        assert!(notification.ongoing);
        assert_eq!(notification.priority, Priority::High);
        assert_eq!(notification.title, "Title");
    }

    #[tokio::test]
    async fn test_bridge_follows_state() {
        let publisher = StatePublisher::new(false);
        let surface = Arc::new(RecordingSurface::default());
        let bridge =
            spawn_notification_bridge(&publisher.watch(), surface.clone(), Notification::default());

        publisher.publish(true);
        publisher.publish(false);
        publisher.publish(true);
        drop(publisher);
        bridge.await.unwrap();

        assert_eq!(
            surface.calls(),
            vec!["post:12345", "cancel:12345", "post:12345", "cancel:12345"]
        );
    }

    #[tokio::test]
    async fn test_bridge_quiet_when_never_active() {
        let publisher = StatePublisher::new(false);
        let surface = Arc::new(RecordingSurface::default());
        let bridge =
            spawn_notification_bridge(&publisher.watch(), surface.clone(), Notification::default());

        drop(publisher);
        bridge.await.unwrap();
        assert!(surface.calls().is_empty());
    }
}
