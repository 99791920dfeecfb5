//! Error handling for firewatch

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport or connectivity failure talking to the gateway
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Gateway answered with a non-success HTTP status
    #[error("Gateway rejected {endpoint}: HTTP {status}")]
    GatewayRejected { endpoint: &'static str, status: u16 },

    /// Gateway answered 200 but the body could not be understood
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// A poll or report call exceeded its time budget
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Report requested while the current incident is not reportable
    #[error("Report not eligible")]
    NotEligible,

    /// Report requested while another one is still in flight
    #[error("Report already in flight")]
    AlreadyInFlight,

    /// Completion of a poll/report cycle that has been superseded
    #[error("Stale completion dropped")]
    StaleCompletion,

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Timeout after `limit`, in whole milliseconds
    pub fn timeout(limit: Duration) -> Self {
        Error::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }

    /// Whether this is a dropped stale completion (never shown to the user)
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleCompletion)
    }

    /// Transport-level failure (as opposed to a gateway verdict)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::NetworkUnavailable(_) | Error::Timeout(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::InvalidResponse(e.to_string())
        } else {
            Error::NetworkUnavailable(e.to_string())
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Error::NetworkUnavailable(_) => (StatusCode::BAD_GATEWAY, "NETWORK_UNAVAILABLE"),
            Error::GatewayRejected { .. } => (StatusCode::BAD_GATEWAY, "GATEWAY_REJECTED"),
            Error::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, "INVALID_RESPONSE"),
            Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            Error::NotEligible => (StatusCode::CONFLICT, "NOT_ELIGIBLE"),
            Error::AlreadyInFlight => (StatusCode::CONFLICT, "ALREADY_IN_FLIGHT"),
            Error::StaleCompletion => (StatusCode::CONFLICT, "STALE_COMPLETION"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let message = self.to_string();

        tracing::warn!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
