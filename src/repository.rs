//! SQLite persistence layer built on SQLx.
//!
//! The store is the single source of truth shared by the ingestion and
//! notification cycles; there is no cross-cycle in-memory state.

use std::str::FromStr;

use log::debug;
use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::repository::table::DeliveryRecordTable;
use crate::repository::table::FilterTable;
use crate::repository::table::ListingTable;
use crate::repository::table::UserTable;

pub mod error;
pub mod table;

/// Main database struct containing all table handlers.
pub struct Repository {
    pool: SqlitePool,
    pub listing: ListingTable,
    pub filter: FilterTable,
    pub delivery_record: DeliveryRecordTable,
    pub user: UserTable,
}

impl Repository {
    /// Creates a new database connection and initializes table handlers.
    pub async fn new(db_url: &str, db_path: &str) -> anyhow::Result<Self> {
        let path = std::path::Path::new(db_path);
        if !path.exists() {
            debug!("Database path {db_path} does not exist. Creating...");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "")?;
            info!("Created {db_path}");
        }

        debug!("Connecting to db...");
        let opts = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;
        info!("Connected to db.");

        let listing = ListingTable::new(pool.clone());
        let filter = FilterTable::new(pool.clone());
        let delivery_record = DeliveryRecordTable::new(pool.clone());
        let user = UserTable::new(pool.clone());

        Ok(Self {
            pool,
            listing,
            filter,
            delivery_record,
            user,
        })
    }

    /// Runs database migrations from the migrations directory.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Deletes all data from all tables. Use with caution!
    pub async fn delete_all_tables(&self) -> anyhow::Result<()> {
        self.delivery_record.delete_all().await?;
        self.filter.delete_all().await?;
        self.listing.delete_all().await?;
        self.user.delete_all().await?;
        Ok(())
    }
}
