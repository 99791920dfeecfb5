//! NotificationSink - Local Alert Delivery
//!
//! ## Responsibilities
//!
//! - Register notification channels (one-time startup step)
//! - Deliver best-effort local notifications on a registered channel
//!
//! Delivery is fire-and-forget: failures never reach the caller.

use crate::models::DetectionStatus;
use crate::realtime_hub::{HubMessage, NotificationMessage, RealtimeHub};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub const NOTIFICATION_TITLE: &str = "Fire Detector";
pub const DEFAULT_SOUND: &str = "default";
pub const DEFAULT_VIBRATE_MS: u64 = 3000;

/// Channel registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub channel_id: String,
    pub channel_name: String,
    pub sound_name: Option<String>,
}

impl ChannelSpec {
    /// The fire alert channel
    pub fn fire_alerts(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            channel_name: "Push Fire Notifications".to_string(),
            sound_name: Some(DEFAULT_SOUND.to_string()),
        }
    }
}

/// A local notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub channel_id: String,
    pub title: String,
    pub message: String,
    pub sound: Option<String>,
    pub vibrate_ms: Option<u64>,
}

impl LocalNotification {
    /// Notification announcing a detection status
    pub fn for_status(channel_id: &str, status: DetectionStatus) -> Self {
        let message = match status {
            DetectionStatus::Detected => "Fire detected on camera",
            _ => "No fire detected on camera",
        };

        Self {
            channel_id: channel_id.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            message: message.to_string(),
            sound: Some(DEFAULT_SOUND.to_string()),
            vibrate_ms: Some(DEFAULT_VIBRATE_MS),
        }
    }
}

/// Best-effort notification delivery
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: LocalNotification);
}

/// Delivers notifications to event-stream clients through the hub
pub struct LocalNotifier {
    channels: RwLock<HashMap<String, ChannelSpec>>,
    hub: Arc<RealtimeHub>,
}

impl LocalNotifier {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            hub,
        }
    }

    /// Register a channel; returns false if it already existed
    pub fn create_channel(&self, spec: ChannelSpec) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels.contains_key(&spec.channel_id) {
            return false;
        }
        tracing::info!(
            channel_id = %spec.channel_id,
            channel_name = %spec.channel_name,
            "Notification channel created"
        );
        channels.insert(spec.channel_id.clone(), spec);
        true
    }

    pub fn channel_exists(&self, channel_id: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(channel_id)
    }
}

impl NotificationSink for LocalNotifier {
    fn notify(&self, notification: LocalNotification) {
        if !self.channel_exists(&notification.channel_id) {
            tracing::debug!(
                channel_id = %notification.channel_id,
                "Notification dropped: channel not created"
            );
            return;
        }

        tracing::info!(
            channel_id = %notification.channel_id,
            title = %notification.title,
            message = %notification.message,
            "Local notification"
        );

        self.hub.broadcast(HubMessage::Notification(NotificationMessage {
            channel_id: notification.channel_id,
            title: notification.title,
            message: notification.message,
            vibrate_ms: notification.vibrate_ms,
        }));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it is handed
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        sent: Mutex<Vec<LocalNotification>>,
    }

    impl RecordingSink {
        pub fn sent(&self) -> Vec<LocalNotification> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: LocalNotification) {
            self.sent.lock().unwrap().push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        let fire = LocalNotification::for_status("fire-channel", DetectionStatus::Detected);
        assert_eq!(fire.title, "Fire Detector");
        assert_eq!(fire.message, "Fire detected on camera");
        assert_eq!(fire.vibrate_ms, Some(3000));

        let clear = LocalNotification::for_status("fire-channel", DetectionStatus::Clear);
        assert_eq!(clear.message, "No fire detected on camera");
    }

    #[test]
    fn test_channel_created_once() {
        let notifier = LocalNotifier::new(Arc::new(RealtimeHub::new()));
        assert!(notifier.create_channel(ChannelSpec::fire_alerts("fire-channel")));
        assert!(!notifier.create_channel(ChannelSpec::fire_alerts("fire-channel")));
        assert!(notifier.channel_exists("fire-channel"));
    }

    #[tokio::test]
    async fn test_notify_requires_channel() {
        let hub = Arc::new(RealtimeHub::new());
        let mut rx = hub.subscribe();
        let notifier = LocalNotifier::new(hub);

        notifier.notify(LocalNotification::for_status("fire-channel", DetectionStatus::Detected));
        assert!(rx.try_recv().is_err());

        notifier.create_channel(ChannelSpec::fire_alerts("fire-channel"));
        notifier.notify(LocalNotification::for_status("fire-channel", DetectionStatus::Detected));
        match rx.recv().await.unwrap() {
            HubMessage::Notification(msg) => {
                assert_eq!(msg.message, "Fire detected on camera");
                assert_eq!(msg.channel_id, "fire-channel");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
