//! Background task retiring listings no longer present on their source
//! site.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::debug;
use log::error;
use log::info;

use crate::model::Source;
use crate::service::listing_service::ListingService;

/// Task that periodically deactivates stale listings per source.
pub struct ListingMaintenanceTask {
    service: Arc<ListingService>,
    interval: Duration,
    retention: chrono::Duration,
    running: AtomicBool,
}

impl ListingMaintenanceTask {
    pub fn new(
        service: Arc<ListingService>,
        interval: Duration,
        retention: chrono::Duration,
    ) -> Arc<Self> {
        info!(
            "Initializing ListingMaintenanceTask with interval {interval:?}, retention {retention}."
        );
        Arc::new(Self {
            service,
            interval,
            retention,
            running: AtomicBool::new(false),
        })
    }

    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            info!("Starting listing maintenance loop.");
            self.spawn_loop();
        }
        Ok(())
    }

    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping listing maintenance loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping maintenance loop.");
                    break;
                }
                if let Err(e) = self.run_once().await {
                    error!("Listing maintenance failed: {e}");
                }
            }
        });
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        debug!("Running listing maintenance.");
        for source in Source::ALL {
            let retired = self.service.deactivate_stale(source, self.retention).await?;
            debug!("Maintenance for {source}: {retired} listings retired.");
        }
        Ok(())
    }
}
