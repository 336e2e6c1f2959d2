use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Runtime configuration, loaded from the environment (with `.env`
/// support in `main`).
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval between notification cycles.
    pub cycle_interval: Duration,
    /// Interval between stale-listing maintenance passes.
    pub maintenance_interval: Duration,
    /// Candidate window for filters that have never been notified.
    pub lookback_hours: i64,
    /// A listing not re-scraped within this many days is deactivated.
    pub retention_days: i64,
    pub db_url: String,
    pub db_path: String,
    pub logs_path: PathBuf,
    /// Dispatch queue endpoint; logs-only gateway when unset.
    pub dispatch_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            cycle_interval: Duration::from_secs(parse_var("CYCLE_INTERVAL", 300)?),
            maintenance_interval: Duration::from_secs(parse_var("MAINTENANCE_INTERVAL", 3600)?),
            lookback_hours: parse_var("LOOKBACK_HOURS", 24)?,
            retention_days: parse_var("RETENTION_DAYS", 7)?,
            db_url: std::env::var("DB_URL").unwrap_or_else(|_| "sqlite://rentwatch.db".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "rentwatch.db".to_string()),
            logs_path: std::env::var("LOGS_PATH")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            dispatch_url: std::env::var("DISPATCH_URL").ok(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| AppError::ConfigurationError {
            msg: format!("{key} has unparsable value `{value}`"),
        }),
        Err(_) => Ok(default),
    }
}
