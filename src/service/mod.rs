use std::sync::Arc;

use chrono::Duration;

use crate::dispatch::DispatchGateway;
use crate::repository::Repository;
use crate::service::filter_service::FilterService;
use crate::service::listing_service::ListingService;
use crate::service::notification_service::NotificationService;

pub mod error;
pub mod filter_service;
pub mod listing_service;
pub mod notification_service;

pub struct Services {
    pub listing: Arc<ListingService>,
    pub filter: Arc<FilterService>,
    pub notification: Arc<NotificationService>,
}

impl Services {
    pub fn new(
        db: Arc<Repository>,
        gateway: Arc<dyn DispatchGateway>,
        lookback: Duration,
    ) -> Self {
        Self {
            listing: Arc::new(ListingService::new(db.clone())),
            filter: Arc::new(FilterService::new(db.clone())),
            notification: Arc::new(NotificationService::new(db, gateway, lookback)),
        }
    }
}
