//! Listing store service: validated ingestion and stale retirement.

use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use log::debug;
use log::info;

use crate::model::ListingModel;
use crate::model::ListingPayload;
use crate::model::NewListing;
use crate::model::Source;
use crate::normalize::canonical_property_type;
use crate::normalize::derive_floor;
use crate::repository::Repository;
use crate::service::error::ServiceError;

/// Service owning listing upsert and lifecycle.
pub struct ListingService {
    pub db: Arc<Repository>,
}

impl ListingService {
    pub fn new(db: Arc<Repository>) -> Self {
        Self { db }
    }

    /// Validates and stores one scraped payload.
    ///
    /// Identity is `(source, external_id)`: a known identity updates the
    /// existing row in place (preserving `scraped_at`), an unknown one
    /// inserts. Derived floor fields and the canonical property type are
    /// computed here, before the write.
    ///
    /// # Performance
    /// * DB calls: 2
    pub async fn ingest(&self, payload: ListingPayload) -> Result<IngestResult, ServiceError> {
        let source =
            Source::parse(&payload.source).ok_or_else(|| ServiceError::Validation {
                message: format!("unknown listing source `{}`", payload.source),
            })?;

        let floor = derive_floor(payload.floor.as_deref(), payload.total_floors);
        let property_type = payload
            .property_type
            .as_deref()
            .map(canonical_property_type);

        let listing = NewListing {
            source,
            external_id: payload.external_id,
            url: payload.url,
            title: payload.title,
            city: payload.city,
            price: payload.price,
            currency: payload.currency,
            property_type,
            property_type_raw: payload.property_type,
            rooms: payload.rooms,
            area: payload.area,
            year_built: payload.year_built,
            floor_raw: payload.floor,
            floor_number: floor.floor_number,
            total_floors: payload.total_floors,
            is_first_floor: floor.is_first_floor,
            is_top_floor: floor.is_top_floor,
            renovation: payload.renovation,
            furnished: payload.furnished,
            pets_allowed: payload.pets_allowed,
            children_friendly: payload.children_friendly,
            agency_commission: payload.agency_commission,
            park_nearby: payload.park_nearby,
            noisy_roads_nearby: payload.noisy_roads_nearby,
        };

        // The lookup only labels the outcome; the write itself is a
        // single conditional upsert and safe against concurrent workers
        // scraping the same ad.
        let existed = self
            .db
            .listing
            .select_by_identity(source, &listing.external_id)
            .await?
            .is_some();

        let stored = self.db.listing.upsert(&listing, Utc::now()).await?;
        debug!(
            "Ingested listing {}/{} as row {}.",
            stored.source, stored.external_id, stored.id
        );

        Ok(if existed {
            IngestResult::Updated { listing: stored }
        } else {
            IngestResult::Created { listing: stored }
        })
    }

    /// Retires listings of a source that have not been re-scraped within
    /// the retention window. Rows are kept for history and dedup.
    ///
    /// # Performance
    /// * DB calls: 1
    pub async fn deactivate_stale(
        &self,
        source: Source,
        older_than: Duration,
    ) -> Result<u64, ServiceError> {
        let cutoff = Utc::now() - older_than;
        let retired = self.db.listing.deactivate_stale(source, cutoff).await?;
        if retired > 0 {
            info!("Deactivated {retired} stale listings for {source}.");
        }
        Ok(retired)
    }
}

/// Outcome of one ingestion call.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum IngestResult {
    /// First scrape of this `(source, external_id)`.
    Created { listing: ListingModel },
    /// Identity already known; mutable fields overwritten.
    Updated { listing: ListingModel },
}

impl IngestResult {
    pub fn listing(&self) -> &ListingModel {
        match self {
            IngestResult::Created { listing } | IngestResult::Updated { listing } => listing,
        }
    }
}
