//! firewatch - Fire Detection Monitoring Client
//!
//! Watches one camera through a remote sensor gateway, notifies on fire
//! detection transitions and lets the user report an incident to the fire
//! department exactly once per incident.
//!
//! ## Architecture
//!
//! 1. GatewayClient - Sensor gateway HTTP adapter
//! 2. StateReconciler - Pure transition function (observation → effects)
//! 3. MonitorState - Owned reconciliation slot with generation stamping
//! 4. FireMonitor - One poll/reconcile/notify cycle
//! 5. PollScheduler - Fixed-period tick with start/stop lifecycle
//! 6. ReportCoordinator - Single-flight fire department report
//! 7. ErrorSurfacer - One visible error dialog at a time
//! 8. NotificationSink - Best-effort local notifications
//! 9. RealtimeHub - Event fan-out (SSE)
//! 10. WebAPI - Control surface
//!
//! ## Data flow
//!
//! Scheduler → FireMonitor (fetch + reconcile) → NotificationSink / RealtimeHub.
//! ReportCoordinator runs on user action and shares MonitorState with the
//! poll cycle; stale completions on either side are dropped.

pub mod error;
pub mod error_surfacer;
pub mod fire_monitor;
pub mod gateway_client;
pub mod models;
pub mod monitor_state;
pub mod notification_sink;
pub mod poll_scheduler;
pub mod realtime_hub;
pub mod report_coordinator;
pub mod state;
pub mod state_reconciler;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
