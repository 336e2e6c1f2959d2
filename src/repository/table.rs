//! Table handlers for the three core tables plus the user surface.

use chrono::DateTime;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::model::DeliveryRecordModel;
use crate::model::FilterModel;
use crate::model::ListingModel;
use crate::model::NewListing;
use crate::model::Source;
use crate::model::UserModel;
use crate::repository::error::DatabaseError;

/// Base table struct providing database pool access.
#[derive(Clone)]
pub struct BaseTable {
    pub pool: SqlitePool,
}

impl BaseTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// ListingTable
// ============================================================================

#[derive(Clone)]
pub struct ListingTable {
    base: BaseTable,
}

impl ListingTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    /// Atomic insert-or-update keyed on `(source, external_id)`.
    ///
    /// One statement, so two concurrent upserts of the same identity can
    /// never leave two rows: the loser of the insert race lands in the
    /// `DO UPDATE` arm. `scraped_at` is written only on first insert;
    /// updates refresh `updated_at` and reactivate the row.
    pub async fn upsert(
        &self,
        listing: &NewListing,
        now: DateTime<Utc>,
    ) -> Result<ListingModel, DatabaseError> {
        let row = sqlx::query_as::<_, ListingModel>(
            r#"
            INSERT INTO listings (
                source, external_id, url, title, city, price, currency,
                property_type, property_type_raw, rooms, area, year_built,
                floor_raw, floor_number, total_floors, is_first_floor, is_top_floor,
                renovation, furnished, pets_allowed, children_friendly,
                agency_commission, park_nearby, noisy_roads_nearby,
                is_active, scraped_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(source, external_id) DO UPDATE SET
                url = excluded.url,
                title = excluded.title,
                city = excluded.city,
                price = excluded.price,
                currency = excluded.currency,
                property_type = excluded.property_type,
                property_type_raw = excluded.property_type_raw,
                rooms = excluded.rooms,
                area = excluded.area,
                year_built = excluded.year_built,
                floor_raw = excluded.floor_raw,
                floor_number = excluded.floor_number,
                total_floors = excluded.total_floors,
                is_first_floor = excluded.is_first_floor,
                is_top_floor = excluded.is_top_floor,
                renovation = excluded.renovation,
                furnished = excluded.furnished,
                pets_allowed = excluded.pets_allowed,
                children_friendly = excluded.children_friendly,
                agency_commission = excluded.agency_commission,
                park_nearby = excluded.park_nearby,
                noisy_roads_nearby = excluded.noisy_roads_nearby,
                is_active = 1,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(listing.source)
        .bind(&listing.external_id)
        .bind(&listing.url)
        .bind(&listing.title)
        .bind(&listing.city)
        .bind(listing.price)
        .bind(&listing.currency)
        .bind(&listing.property_type)
        .bind(&listing.property_type_raw)
        .bind(listing.rooms)
        .bind(listing.area)
        .bind(listing.year_built)
        .bind(&listing.floor_raw)
        .bind(listing.floor_number)
        .bind(listing.total_floors)
        .bind(listing.is_first_floor)
        .bind(listing.is_top_floor)
        .bind(&listing.renovation)
        .bind(listing.furnished)
        .bind(listing.pets_allowed)
        .bind(listing.children_friendly)
        .bind(listing.agency_commission)
        .bind(listing.park_nearby)
        .bind(listing.noisy_roads_nearby)
        .bind(now)
        .bind(now)
        .fetch_one(&self.base.pool)
        .await?;
        Ok(row)
    }

    pub async fn select(&self, id: i64) -> Result<Option<ListingModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, ListingModel>("SELECT * FROM listings WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn select_by_identity(
        &self,
        source: Source,
        external_id: &str,
    ) -> Result<Option<ListingModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ListingModel>(
            "SELECT * FROM listings WHERE source = ? AND external_id = ?",
        )
        .bind(source)
        .bind(external_id)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    /// Active listings touched since the given instant, the candidate
    /// set for one filter's notification pass.
    pub async fn select_candidates(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ListingModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ListingModel>(
            "SELECT * FROM listings WHERE is_active = 1 AND updated_at >= ?",
        )
        .bind(since)
        .fetch_all(&self.base.pool)
        .await?)
    }

    /// Flips `is_active` off for rows of a source not scraped since the
    /// cutoff. Rows are never deleted; the ledger must stay joinable.
    pub async fn deactivate_stale(
        &self,
        source: Source,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let res = sqlx::query(
            "UPDATE listings SET is_active = 0 WHERE source = ? AND is_active = 1 AND scraped_at < ?",
        )
        .bind(source)
        .bind(cutoff)
        .execute(&self.base.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.base.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM listings")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// FilterTable
// ============================================================================

#[derive(Clone)]
pub struct FilterTable {
    base: BaseTable,
}

impl FilterTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    pub async fn insert(&self, filter: &FilterModel) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO filters (
                user_id, name, criteria, is_active, notification_enabled,
                notification_frequency_hours, last_notification_sent
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.name)
        .bind(&filter.criteria)
        .bind(filter.is_active)
        .bind(filter.notification_enabled)
        .bind(filter.notification_frequency_hours)
        .bind(filter.last_notification_sent)
        .fetch_one(&self.base.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn select(&self, id: i64) -> Result<Option<FilterModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, FilterModel>("SELECT * FROM filters WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn update(&self, filter: &FilterModel) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE filters SET
                user_id = ?, name = ?, criteria = ?, is_active = ?,
                notification_enabled = ?, notification_frequency_hours = ?,
                last_notification_sent = ?
            WHERE id = ?
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.name)
        .bind(&filter.criteria)
        .bind(filter.is_active)
        .bind(filter.notification_enabled)
        .bind(filter.notification_frequency_hours)
        .bind(filter.last_notification_sent)
        .bind(filter.id)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM filters WHERE id = ?")
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    pub async fn select_all_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Vec<FilterModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, FilterModel>("SELECT * FROM filters WHERE user_id = ? ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.base.pool)
                .await?,
        )
    }

    /// Filters in the `Eligible` state at the given instant: active,
    /// notifications on, and past (or never started) their cooldown.
    pub async fn select_due(&self, now: DateTime<Utc>) -> Result<Vec<FilterModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, FilterModel>(
            r#"
            SELECT * FROM filters
            WHERE is_active = 1
                AND notification_enabled = 1
                AND (
                    last_notification_sent IS NULL
                    OR strftime('%s', ?1) - strftime('%s', last_notification_sent)
                        >= notification_frequency_hours * 3600
                )
            ORDER BY id
            "#,
        )
        .bind(now)
        .fetch_all(&self.base.pool)
        .await?)
    }

    /// Advances a filter into `Cooling`. Called once per processed cycle
    /// per filter, match count notwithstanding.
    pub async fn set_last_notification_sent(
        &self,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE filters SET last_notification_sent = ? WHERE id = ?")
            .bind(sent_at)
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM filters")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// DeliveryRecordTable
// ============================================================================

#[derive(Clone)]
pub struct DeliveryRecordTable {
    base: BaseTable,
}

impl DeliveryRecordTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    pub async fn exists(&self, user_id: i64, listing_id: i64) -> Result<bool, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM delivery_records WHERE user_id = ? AND listing_id = ?",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_one(&self.base.pool)
        .await?;
        Ok(row.0 > 0)
    }

    /// Writes the ledger entry unless one already exists for the pair.
    ///
    /// Returns whether a row was actually inserted. The UNIQUE(user_id,
    /// listing_id) constraint makes this the at-most-once gate even
    /// against a concurrent cycle.
    pub async fn insert_once(
        &self,
        user_id: i64,
        listing_id: i64,
        filter_id: Option<i64>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let res = sqlx::query(
            r#"
            INSERT OR IGNORE INTO delivery_records (user_id, listing_id, filter_id, sent_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(filter_id)
        .bind(sent_at)
        .execute(&self.base.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn select_all_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Vec<DeliveryRecordModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, DeliveryRecordModel>(
            "SELECT * FROM delivery_records WHERE user_id = ? ORDER BY sent_at",
        )
        .bind(user_id)
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delivery_records")
            .fetch_one(&self.base.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM delivery_records")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// UserTable
// ============================================================================

#[derive(Clone)]
pub struct UserTable {
    base: BaseTable,
}

impl UserTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    /// Users are owned by the external API layer; the core only mirrors
    /// id and channel preferences, so writes are plain upserts.
    ///
    /// Not `REPLACE INTO`: that deletes before inserting, and the
    /// cascade from filters would wipe the user's saved searches on a
    /// preferences update.
    pub async fn replace(&self, user: &UserModel) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, channel_preferences) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET channel_preferences = excluded.channel_preferences
            "#,
        )
        .bind(user.id)
        .bind(&user.channel_preferences)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    pub async fn select(&self, id: i64) -> Result<Option<UserModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, UserModel>("SELECT * FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM users")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}
