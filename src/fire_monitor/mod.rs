//! FireMonitor - Poll/Reconcile/Notify Cycle
//!
//! ## Responsibilities
//!
//! - Fetch the camera observation once per tick (bounded by a timeout)
//! - Reconcile it through `MonitorState`
//! - Dispatch effects: local notification, hub messages
//! - Surface poll failures through the ErrorSurfacer

use crate::error::{Error, Result};
use crate::error_surfacer::{AlertKind, ErrorSurfacer};
use crate::gateway_client::SensorGateway;
use crate::models::Effect;
use crate::monitor_state::MonitorState;
use crate::notification_sink::{LocalNotification, NotificationSink};
use crate::poll_scheduler::PollTask;
use crate::realtime_hub::{
    HubMessage, RealtimeHub, ReportUpdatedMessage, SnapshotUpdatedMessage, StatusChangedMessage,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Per-instance monitor settings
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub camera_id: String,
    pub notification_channel: String,
    pub poll_timeout: Duration,
}

/// FireMonitor instance
pub struct FireMonitor {
    config: MonitorConfig,
    gateway: Arc<dyn SensorGateway>,
    state: Arc<MonitorState>,
    notifier: Arc<dyn NotificationSink>,
    surfacer: Arc<ErrorSurfacer>,
    hub: Arc<RealtimeHub>,
}

impl FireMonitor {
    pub fn new(
        config: MonitorConfig,
        gateway: Arc<dyn SensorGateway>,
        state: Arc<MonitorState>,
        notifier: Arc<dyn NotificationSink>,
        surfacer: Arc<ErrorSurfacer>,
        hub: Arc<RealtimeHub>,
    ) -> Self {
        Self {
            config,
            gateway,
            state,
            notifier,
            surfacer,
            hub,
        }
    }

    /// Run one poll cycle and return the effects it applied
    pub async fn poll_once(&self) -> Result<Vec<Effect>> {
        let camera_id = &self.config.camera_id;
        let ticket = self.state.begin_poll().await;

        let fetched = match timeout(
            self.config.poll_timeout,
            self.gateway.get_observation(camera_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(self.config.poll_timeout)),
        };

        let observation = match fetched {
            Ok(observation) => observation,
            Err(e) => {
                if !self.state.is_current_poll(&ticket).await {
                    tracing::debug!(seq = ticket.seq(), error = %e, "Stale poll failure dropped");
                    return Err(Error::StaleCompletion);
                }
                tracing::warn!(camera_id = %camera_id, error = %e, "Camera poll failed");
                let kind = if e.is_transport() {
                    AlertKind::ConnectionFailed
                } else {
                    AlertKind::CameraFetchFailed
                };
                self.surfacer.report(kind).await;
                return Err(e);
            }
        };

        let captured_at = observation.captured_at.clone();
        let status = observation.status;
        let effects = self.state.apply_observation(&ticket, observation).await?;

        tracing::debug!(
            camera_id = %camera_id,
            status = %status,
            captured_at = %captured_at,
            "Observation applied"
        );
        self.hub.broadcast(HubMessage::SnapshotUpdated(SnapshotUpdatedMessage {
            camera_id: camera_id.clone(),
            captured_at,
            status,
        }));

        for effect in &effects {
            self.dispatch(*effect).await;
        }

        Ok(effects)
    }

    async fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::Notify(status) => {
                tracing::info!(
                    camera_id = %self.config.camera_id,
                    status = %status,
                    "Detection status changed"
                );
                self.notifier.notify(LocalNotification::for_status(
                    &self.config.notification_channel,
                    status,
                ));
                self.hub.broadcast(HubMessage::StatusChanged(StatusChangedMessage {
                    camera_id: self.config.camera_id.clone(),
                    status,
                    label: status.label().to_string(),
                }));
            }
            Effect::ReportCancelled => {
                tracing::info!(
                    camera_id = %self.config.camera_id,
                    "Fire cleared while report in flight; report discarded"
                );
                let snapshot = self.state.snapshot().await;
                self.hub.broadcast(HubMessage::ReportUpdated(ReportUpdatedMessage {
                    phase: snapshot.report_phase,
                    contact: None,
                }));
            }
        }
    }
}

#[async_trait]
impl PollTask for FireMonitor {
    async fn poll(&self) {
        // Failures are already surfaced; the next tick retries
        match self.poll_once().await {
            Err(e) if !e.is_stale() => {
                tracing::debug!(error = %e, "Poll tick finished with error");
            }
            _ => {}
        }
    }

    async fn invalidate(&self) {
        self.state.invalidate_polls().await;
    }
}
