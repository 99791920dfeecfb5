//! WebAPI - Control Surface
//!
//! ## Responsibilities
//!
//! - Expose what the monitor screen shows (status, snapshot, responder)
//! - Accept user actions (file report, dismiss error dialog)
//! - Stream hub events to connected clients (SSE)

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error_surfacer::Alert;
use crate::models::{DetectionStatus, ReconciliationState, ReportPhase, ResponderContact};
use crate::state::AppState;

/// Report control as the screen renders it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub phase: ReportPhase,
    pub eligible: bool,
    /// The report button only exists while fire is detected
    pub button_visible: bool,
    pub button_enabled: bool,
}

/// GET /api/status response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub camera_id: String,
    pub status: DetectionStatus,
    pub status_label: String,
    pub captured_at: Option<String>,
    pub image_loaded: bool,
    pub report: ReportView,
    /// Present once a report was accepted for the ongoing fire
    pub responder: Option<ResponderContact>,
    pub alert: Option<Alert>,
}

impl StatusView {
    pub fn build(camera_id: &str, state: &ReconciliationState, alert: Option<Alert>) -> Self {
        let status = state.status();
        let detected = status == DetectionStatus::Detected;
        let observation = state.last_observation.as_ref();

        Self {
            camera_id: camera_id.to_string(),
            status,
            status_label: status.label().to_string(),
            captured_at: observation.map(|o| o.captured_at.clone()),
            image_loaded: observation.is_some_and(|o| !o.image.is_empty()),
            report: ReportView {
                phase: state.report_phase,
                eligible: state.report_eligible,
                button_visible: detected,
                button_enabled: state.report_eligible && !state.report_phase.is_in_flight(),
            },
            responder: if detected {
                state.incident_contact.clone()
            } else {
                None
            },
            alert,
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "polling": state.scheduler.is_running().await,
        "event_clients": state.realtime.client_count(),
    }))
}
