//! Application entry point for rentwatch.
//!
//! Wires config, storage, services and the periodic cycle tasks.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;

use rentwatch::config::Config;
use rentwatch::dispatch::DispatchGateway;
use rentwatch::dispatch::log_gateway::LogDispatchGateway;
use rentwatch::dispatch::webhook_gateway::WebhookDispatchGateway;
use rentwatch::logging::setup_logging;
use rentwatch::repository::Repository;
use rentwatch::service::Services;
use rentwatch::task::listing_maintenance::ListingMaintenanceTask;
use rentwatch::task::notification_cycle::NotificationCycleTask;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;

    let db = setup_database(&config, init_start).await?;
    let gateway = setup_gateway(&config);
    let services = Arc::new(Services::new(
        db,
        gateway,
        chrono::Duration::hours(config.lookback_hours),
    ));

    setup_tasks(&config, &services, init_start)?;

    run(init_start).await
}

fn load_config() -> Result<Config> {
    debug!("Loading configuration...");
    let config = Config::load()?;
    setup_logging(&config)?;
    info!("Starting rentwatch...");
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Repository>> {
    debug!("Setting up Repository...");
    let db = Arc::new(Repository::new(&config.db_url, &config.db_path).await?);

    info!("Running database migrations...");
    db.run_migrations().await?;
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    Ok(db)
}

fn setup_gateway(config: &Config) -> Arc<dyn DispatchGateway> {
    match &config.dispatch_url {
        Some(url) => {
            info!("Dispatching to {url}.");
            Arc::new(WebhookDispatchGateway::new(url.clone()))
        }
        None => {
            info!("No DISPATCH_URL configured; dispatch requests will only be logged.");
            Arc::new(LogDispatchGateway)
        }
    }
}

fn setup_tasks(config: &Config, services: &Services, init_start: Instant) -> Result<()> {
    debug!("Setting up tasks...");

    NotificationCycleTask::new(services.notification.clone(), config.cycle_interval).start()?;
    ListingMaintenanceTask::new(
        services.listing.clone(),
        config.maintenance_interval,
        chrono::Duration::days(config.retention_days),
    )
    .start()?;

    info!(
        "Tasks setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "rentwatch is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
