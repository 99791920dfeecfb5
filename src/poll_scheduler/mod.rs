//! PollScheduler - Fixed-Period Poll Loop
//!
//! ## Responsibilities
//!
//! - Invoke the poll task on a fixed interval
//! - Never overlap two polls (a slow poll delays the next tick)
//! - Start/stop lifecycle; `stop` is idempotent
//!
//! No retry logic lives here: a failed poll is one failed tick.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Work performed on every tick
#[async_trait]
pub trait PollTask: Send + Sync {
    /// Run one poll cycle. Failures are handled inside the task.
    async fn poll(&self);

    /// Called by `stop` so results of cycles already started are dropped
    async fn invalidate(&self) {}
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// PollScheduler instance
pub struct PollScheduler {
    task: Arc<dyn PollTask>,
    period: Duration,
    running: Mutex<Option<Running>>,
}

impl PollScheduler {
    pub fn new(task: Arc<dyn PollTask>, period: Duration) -> Self {
        Self {
            task,
            period,
            running: Mutex::new(None),
        }
    }

    /// Start polling loop; returns false if already running
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::warn!("Polling already running");
            return false;
        }

        tracing::info!(period_ms = self.period.as_millis() as u64, "Starting poll scheduler");

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = self.task.clone();
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // In-flight poll is dropped on stop
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = task.poll() => {}
                }
            }

            tracing::info!("Poll scheduler stopped");
        });

        *running = Some(Running { cancel, handle });
        true
    }

    /// Stop polling loop
    ///
    /// No poll is invoked after this returns, and results of a poll that was
    /// in flight are invalidated.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        tracing::info!("Stopping poll scheduler");
        running.cancel.cancel();
        self.task.invalidate().await;

        if let Err(e) = running.handle.await {
            if e.is_panic() {
                tracing::error!(error = %e, "Poll loop panicked");
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}
