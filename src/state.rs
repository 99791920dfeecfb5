//! Application state
//!
//! Holds all shared components and startup configuration

use crate::error::{Error, Result};
use crate::error_surfacer::ErrorSurfacer;
use crate::monitor_state::MonitorState;
use crate::poll_scheduler::PollScheduler;
use crate::realtime_hub::RealtimeHub;
use crate::report_coordinator::ReportCoordinator;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration (fixed at startup)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Sensor gateway base URL
    pub gateway_url: String,
    /// Camera being watched
    pub camera_id: String,
    /// User filing incident reports
    pub user_id: String,
    /// Responder whose contact is fetched after a report
    pub responder_id: String,
    /// Poll period
    pub poll_interval_ms: u64,
    /// Upper bound for one observation fetch
    pub poll_timeout_ms: u64,
    /// Upper bound for each report call
    pub report_timeout_ms: u64,
    /// Local notification channel
    pub notification_channel: String,
    /// Control API port
    pub port: u16,
    /// Control API host
    pub host: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_url: env_or("GATEWAY_URL", "https://sfh-server.herokuapp.com"),
            camera_id: env_or("CAMERA_ID", "cam1"),
            user_id: env_or("USER_ID", "user1"),
            responder_id: env_or("RESPONDER_ID", "fighter1"),
            poll_interval_ms: env_parse_or("POLL_INTERVAL_MS", 1000),
            poll_timeout_ms: env_parse_or("POLL_TIMEOUT_MS", 5000),
            report_timeout_ms: env_parse_or("REPORT_TIMEOUT_MS", 10_000),
            notification_channel: env_or("NOTIFICATION_CHANNEL", "fire-channel"),
            port: env_parse_or("PORT", 8080),
            host: env_or("HOST", "0.0.0.0"),
        }
    }
}

impl AppConfig {
    /// Reject settings the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "GATEWAY_URL must be an http(s) URL, got {:?}",
                self.gateway_url
            )));
        }
        for (name, value) in [
            ("CAMERA_ID", &self.camera_id),
            ("USER_ID", &self.user_id),
            ("RESPONDER_ID", &self.responder_id),
            ("NOTIFICATION_CHANNEL", &self.notification_channel),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        for (name, value) in [
            ("POLL_INTERVAL_MS", self.poll_interval_ms),
            ("POLL_TIMEOUT_MS", self.poll_timeout_ms),
            ("REPORT_TIMEOUT_MS", self.report_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Reconciliation slot
    pub monitor: Arc<MonitorState>,
    /// Report workflow
    pub coordinator: Arc<ReportCoordinator>,
    /// Error dialogs
    pub surfacer: Arc<ErrorSurfacer>,
    /// Event stream fan-out
    pub realtime: Arc<RealtimeHub>,
    /// Poll loop
    pub scheduler: Arc<PollScheduler>,
}
