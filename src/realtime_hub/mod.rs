//! RealtimeHub - Event Distribution
//!
//! ## Responsibilities
//!
//! - Fan out monitor events to every connected event-stream client
//! - Snapshot update notifications (client fetches the image over HTTP)
//! - Status transitions, report progress, alert dialogs, local notifications
//!
//! Note: image bytes are never pushed through the hub. Clients fetch
//! GET /api/snapshot/latest.jpg after a `snapshot_updated` message.

use crate::models::{DetectionStatus, ReportPhase, ResponderContact};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity; slower receivers skip older messages
const DEFAULT_CAPACITY: usize = 64;

/// Hub message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum HubMessage {
    /// A poll applied a new observation
    SnapshotUpdated(SnapshotUpdatedMessage),
    /// Detection status transition
    StatusChanged(StatusChangedMessage),
    /// Report workflow progress
    ReportUpdated(ReportUpdatedMessage),
    /// Error dialog opened
    AlertShown(AlertMessage),
    /// Error dialog acknowledged
    AlertDismissed,
    /// Local notification delivered on a channel
    Notification(NotificationMessage),
}

/// Snapshot updated notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotUpdatedMessage {
    pub camera_id: String,
    pub captured_at: String,
    pub status: DetectionStatus,
}

/// Status transition message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedMessage {
    pub camera_id: String,
    pub status: DetectionStatus,
    pub label: String,
}

/// Report progress message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportUpdatedMessage {
    pub phase: ReportPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ResponderContact>,
}

/// Alert dialog message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub title: String,
    pub message: String,
}

/// Local notification message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub channel_id: String,
    pub title: String,
    pub message: String,
    pub vibrate_ms: Option<u64>,
}

/// RealtimeHub instance
pub struct RealtimeHub {
    tx: broadcast::Sender<HubMessage>,
}

impl RealtimeHub {
    /// Create new RealtimeHub
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a client
    pub fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        let rx = self.tx.subscribe();
        tracing::debug!(clients = self.tx.receiver_count(), "Hub client subscribed");
        rx
    }

    /// Broadcast message to all clients
    pub fn broadcast(&self, message: HubMessage) {
        // No receivers is not an error
        if let Ok(count) = self.tx.send(message) {
            tracing::trace!(clients = count, "Hub message broadcast");
        }
    }

    /// Get connected client count
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let hub = RealtimeHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.client_count(), 2);

        hub.broadcast(HubMessage::AlertDismissed);

        assert_eq!(a.recv().await.unwrap(), HubMessage::AlertDismissed);
        assert_eq!(b.recv().await.unwrap(), HubMessage::AlertDismissed);
    }

    #[test]
    fn test_broadcast_without_clients_is_noop() {
        let hub = RealtimeHub::new();
        hub.broadcast(HubMessage::AlertDismissed);
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn test_message_wire_format() {
        let msg = HubMessage::StatusChanged(StatusChangedMessage {
            camera_id: "cam1".to_string(),
            status: DetectionStatus::Detected,
            label: DetectionStatus::Detected.label().to_string(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["data"]["status"], "detected");
        assert_eq!(json["data"]["label"], "FIRE DETECTED");
    }
}
