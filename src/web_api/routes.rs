//! API Routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use super::StatusView;
use crate::error::Result;
use crate::models::{ReportPhase, ResponderContact};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(get_status))
        .route("/api/snapshot/latest.jpg", get(latest_snapshot))
        .route("/api/report", post(file_report))
        .route("/api/alert/dismiss", post(dismiss_alert))
        .route("/api/events", get(event_stream))
        .with_state(state)
}

/// GET /api/status
async fn get_status(State(state): State<AppState>) -> Json<StatusView> {
    let snapshot = state.monitor.snapshot().await;
    let alert = state.surfacer.current().await;
    Json(StatusView::build(&state.config.camera_id, &snapshot, alert))
}

/// GET /api/snapshot/latest.jpg
/// Serves the gateway's image payload verbatim
async fn latest_snapshot(State(state): State<AppState>) -> Response {
    let snapshot = state.monitor.snapshot().await;
    let Some(observation) = snapshot.last_observation.filter(|o| !o.image.is_empty()) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error_code": "NOT_FOUND",
                "message": "No snapshot received yet"
            })),
        )
            .into_response();
    };

    match observation.image.decode() {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot payload is not valid base64");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error_code": "INVALID_SNAPSHOT",
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    phase: ReportPhase,
    contact: ResponderContact,
}

/// POST /api/report
async fn file_report(State(state): State<AppState>) -> Result<Json<ReportResponse>> {
    let contact = state.coordinator.file_report().await?;
    Ok(Json(ReportResponse {
        phase: ReportPhase::Accepted,
        contact,
    }))
}

/// POST /api/alert/dismiss
async fn dismiss_alert(State(state): State<AppState>) -> impl IntoResponse {
    let dismissed = state.surfacer.dismiss().await;
    Json(json!({ "dismissed": dismissed }))
}

/// GET /api/events
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let rx = state.realtime.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => return Some((Event::default().json_data(&message), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped = skipped, "Event stream client lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
