//! ErrorSurfacer - User-Visible Error Dialogs
//!
//! ## Responsibilities
//!
//! - Show at most one error dialog at a time
//! - Collapse failures that happen while a dialog is open
//! - Reopen only after the user dismisses the current dialog

use crate::realtime_hub::{AlertMessage, HubMessage, RealtimeHub};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Dialog title
pub const ALERT_TITLE: &str = "Error";

/// What went wrong, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Transport failure or timeout on any gateway call
    ConnectionFailed,
    /// Gateway refused or garbled the snapshot poll
    CameraFetchFailed,
    /// Case was not opened
    CaseSubmissionFailed,
    /// Case was opened but the responder lookup failed
    ResponderFetchFailed,
}

impl AlertKind {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ConnectionFailed => "Internet connection failed",
            Self::CameraFetchFailed => "Failed to fetch camera image",
            Self::CaseSubmissionFailed => "Failed to send report to the fire department",
            Self::ResponderFetchFailed => {
                "Report sent, but fire department info is unavailable"
            }
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A dialog currently on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Open/closed latch for the single visible dialog
#[derive(Debug, Default)]
pub struct AlertLatch {
    visible: Option<Alert>,
}

impl AlertLatch {
    /// Open the latch with `alert`; false if a dialog is already showing
    pub fn try_show(&mut self, alert: Alert) -> bool {
        if self.visible.is_some() {
            return false;
        }
        self.visible = Some(alert);
        true
    }

    /// Close the latch
    pub fn dismiss(&mut self) -> Option<Alert> {
        self.visible.take()
    }

    pub fn current(&self) -> Option<&Alert> {
        self.visible.as_ref()
    }
}

/// ErrorSurfacer instance
pub struct ErrorSurfacer {
    latch: RwLock<AlertLatch>,
    hub: Arc<RealtimeHub>,
    suppressed: AtomicU64,
}

impl ErrorSurfacer {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self {
            latch: RwLock::new(AlertLatch::default()),
            hub,
            suppressed: AtomicU64::new(0),
        }
    }

    /// Show `kind` unless a dialog is already open
    ///
    /// Returns true if a dialog was opened.
    pub async fn report(&self, kind: AlertKind) -> bool {
        let alert = Alert {
            kind,
            title: ALERT_TITLE.to_string(),
            message: kind.message().to_string(),
            shown_at: Utc::now(),
        };
        let shown = self.latch.write().await.try_show(alert);

        if shown {
            tracing::warn!(kind = ?kind, message = %kind, "Error dialog shown");
            self.hub.broadcast(HubMessage::AlertShown(AlertMessage {
                title: ALERT_TITLE.to_string(),
                message: kind.message().to_string(),
            }));
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(kind = ?kind, "Error collapsed into visible dialog");
        }

        shown
    }

    /// User acknowledged the dialog; returns false if none was open
    pub async fn dismiss(&self) -> bool {
        let dismissed = self.latch.write().await.dismiss();
        match dismissed {
            Some(alert) => {
                tracing::info!(kind = ?alert.kind, "Error dialog dismissed");
                self.hub.broadcast(HubMessage::AlertDismissed);
                true
            }
            None => false,
        }
    }

    /// Dialog currently on screen
    pub async fn current(&self) -> Option<Alert> {
        self.latch.read().await.current().cloned()
    }

    /// Number of failures collapsed into an already-open dialog
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surfacer() -> ErrorSurfacer {
        ErrorSurfacer::new(Arc::new(RealtimeHub::new()))
    }

    #[tokio::test]
    async fn test_first_error_is_shown() {
        let surfacer = surfacer();
        assert!(surfacer.report(AlertKind::ConnectionFailed).await);
        let alert = surfacer.current().await.unwrap();
        assert_eq!(alert.kind, AlertKind::ConnectionFailed);
        assert_eq!(alert.message, "Internet connection failed");
    }

    #[tokio::test]
    async fn test_errors_collapse_while_open() {
        let surfacer = surfacer();
        assert!(surfacer.report(AlertKind::CameraFetchFailed).await);
        assert!(!surfacer.report(AlertKind::CameraFetchFailed).await);
        assert!(!surfacer.report(AlertKind::ConnectionFailed).await);

        assert_eq!(surfacer.suppressed_count(), 2);
        assert_eq!(
            surfacer.current().await.map(|a| a.kind),
            Some(AlertKind::CameraFetchFailed)
        );
    }

    #[tokio::test]
    async fn test_dismiss_reopens_latch() {
        let surfacer = surfacer();
        surfacer.report(AlertKind::CameraFetchFailed).await;
        assert!(surfacer.dismiss().await);
        assert!(!surfacer.dismiss().await);

        assert!(surfacer.report(AlertKind::CaseSubmissionFailed).await);
    }

    #[tokio::test]
    async fn test_concurrent_failures_show_one_dialog() {
        let surfacer = Arc::new(surfacer());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = surfacer.clone();
                tokio::spawn(async move { s.report(AlertKind::ConnectionFailed).await })
            })
            .collect();

        let mut shown = 0;
        for h in handles {
            if h.await.unwrap() {
                shown += 1;
            }
        }
        assert_eq!(shown, 1);
        assert_eq!(surfacer.suppressed_count(), 7);
    }

    #[tokio::test]
    async fn test_alert_broadcast() {
        let hub = Arc::new(RealtimeHub::new());
        let mut rx = hub.subscribe();
        let surfacer = ErrorSurfacer::new(hub);

        surfacer.report(AlertKind::ResponderFetchFailed).await;
        surfacer.dismiss().await;

        match rx.recv().await.unwrap() {
            HubMessage::AlertShown(msg) => assert_eq!(msg.title, "Error"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(rx.recv().await.unwrap(), HubMessage::AlertDismissed);
    }

    #[test]
    fn test_step_messages_are_distinct() {
        assert_ne!(
            AlertKind::CaseSubmissionFailed.message(),
            AlertKind::ResponderFetchFailed.message()
        );
    }
}
