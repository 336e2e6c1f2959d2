//! Background task for the periodic notification cycle.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use log::error;
use log::info;

use crate::service::notification_service::NotificationService;

/// Task that periodically runs the matching-and-notification pass.
pub struct NotificationCycleTask {
    service: Arc<NotificationService>,
    cycle_interval: Duration,
    running: AtomicBool,
}

impl NotificationCycleTask {
    pub fn new(service: Arc<NotificationService>, cycle_interval: Duration) -> Arc<Self> {
        info!("Initializing NotificationCycleTask with interval {cycle_interval:?}");
        Arc::new(Self {
            service,
            cycle_interval,
            running: AtomicBool::new(false),
        })
    }

    /// Starts the cycle loop.
    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            info!("Starting notification cycle loop.");
            self.spawn_cycle_loop();
        }
        Ok(())
    }

    /// Stops the cycle loop.
    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping notification cycle loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_cycle_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.cycle_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping cycle loop.");
                    break;
                }
                // A failed cycle is retried whole on the next tick.
                if let Err(e) = self.run_once().await {
                    error!("Notification cycle failed: {e}");
                }
            }
        });
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        debug!("Running notification cycle.");
        let report = self.service.run_cycle(Utc::now()).await?;
        debug!(
            "Cycle report: {} filters, {} candidates, {} matched, {} dispatched, {} duplicates, {} rejected.",
            report.filters_processed,
            report.candidates_evaluated,
            report.matched,
            report.dispatched,
            report.duplicates_skipped,
            report.rejected
        );
        Ok(())
    }
}
