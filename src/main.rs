//! firewatch - Fire Detection Monitoring Client
//!
//! Main entry point.

use firewatch::{
    error_surfacer::ErrorSurfacer,
    fire_monitor::{FireMonitor, MonitorConfig},
    gateway_client::{HttpGateway, SensorGateway},
    monitor_state::MonitorState,
    notification_sink::{ChannelSpec, LocalNotifier},
    poll_scheduler::PollScheduler,
    realtime_hub::RealtimeHub,
    report_coordinator::{ReportCoordinator, ReportIdentity},
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firewatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting firewatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    config.validate()?;
    tracing::info!(
        gateway_url = %config.gateway_url,
        camera_id = %config.camera_id,
        user_id = %config.user_id,
        responder_id = %config.responder_id,
        poll_interval_ms = config.poll_interval_ms,
        poll_timeout_ms = config.poll_timeout_ms,
        report_timeout_ms = config.report_timeout_ms,
        "Configuration loaded"
    );

    // Initialize components
    let gateway: Arc<dyn SensorGateway> = Arc::new(HttpGateway::new(
        config.gateway_url.clone(),
        config.report_timeout().max(config.poll_timeout()),
    )?);
    let realtime = Arc::new(RealtimeHub::new());
    let monitor_state = Arc::new(MonitorState::new());
    let surfacer = Arc::new(ErrorSurfacer::new(realtime.clone()));

    // Notification channel must exist before the first poll
    let notifier = Arc::new(LocalNotifier::new(realtime.clone()));
    notifier.create_channel(ChannelSpec::fire_alerts(&config.notification_channel));

    let fire_monitor = Arc::new(FireMonitor::new(
        MonitorConfig {
            camera_id: config.camera_id.clone(),
            notification_channel: config.notification_channel.clone(),
            poll_timeout: config.poll_timeout(),
        },
        gateway.clone(),
        monitor_state.clone(),
        notifier,
        surfacer.clone(),
        realtime.clone(),
    ));
    tracing::info!("FireMonitor initialized");

    let coordinator = Arc::new(ReportCoordinator::new(
        gateway,
        monitor_state.clone(),
        surfacer.clone(),
        realtime.clone(),
        ReportIdentity {
            user_id: config.user_id.clone(),
            responder_id: config.responder_id.clone(),
        },
        config.report_timeout(),
    ));
    tracing::info!("ReportCoordinator initialized");

    let scheduler = Arc::new(PollScheduler::new(fire_monitor, config.poll_interval()));

    let state = AppState {
        config: config.clone(),
        monitor: monitor_state,
        coordinator,
        surfacer,
        realtime,
        scheduler: scheduler.clone(),
    };

    let app = web_api::create_router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start polling
    scheduler.start().await;

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    tracing::info!("firewatch stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
