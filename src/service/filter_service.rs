//! Saved-search management service.

use std::sync::Arc;

use crate::model::FilterCriteria;
use crate::model::FilterModel;
use crate::model::NewFilter;
use crate::repository::Repository;
use crate::service::error::ServiceError;

/// Cooldown bounds in hours, one hour to one week.
const MIN_FREQUENCY_HOURS: i64 = 1;
const MAX_FREQUENCY_HOURS: i64 = 168;

/// Service for creating and toggling user filters.
///
/// The schema supports any number of concurrent filters per user; the
/// core imposes no per-user cap.
pub struct FilterService {
    pub db: Arc<Repository>,
}

impl FilterService {
    pub fn new(db: Arc<Repository>) -> Self {
        Self { db }
    }

    /// Creates a filter after validating consistent range bounds and a
    /// cooldown within [1, 168] hours. New filters
    /// start active with notifications enabled and no cooldown history.
    ///
    /// # Performance
    /// * DB calls: 2
    pub async fn create(&self, new: NewFilter) -> Result<FilterModel, ServiceError> {
        validate_frequency(new.notification_frequency_hours)?;
        validate_criteria(&new.criteria)?;

        let mut filter = FilterModel {
            id: 0,
            user_id: new.user_id,
            name: new.name,
            criteria: sqlx::types::Json(new.criteria),
            is_active: true,
            notification_enabled: true,
            notification_frequency_hours: new.notification_frequency_hours,
            last_notification_sent: None,
        };
        filter.id = self.db.filter.insert(&filter).await?;
        Ok(filter)
    }

    /// Replaces the criteria of an existing filter.
    ///
    /// # Performance
    /// * DB calls: 2
    pub async fn update_criteria(
        &self,
        filter_id: i64,
        criteria: FilterCriteria,
    ) -> Result<UpdateResult, ServiceError> {
        validate_criteria(&criteria)?;

        let Some(mut filter) = self.db.filter.select(filter_id).await? else {
            return Ok(UpdateResult::NotFound);
        };
        filter.criteria = sqlx::types::Json(criteria);
        self.db.filter.update(&filter).await?;
        Ok(UpdateResult::Updated { filter })
    }

    /// # Performance
    /// * DB calls: 2
    pub async fn set_frequency(
        &self,
        filter_id: i64,
        hours: i64,
    ) -> Result<UpdateResult, ServiceError> {
        validate_frequency(hours)?;

        let Some(mut filter) = self.db.filter.select(filter_id).await? else {
            return Ok(UpdateResult::NotFound);
        };
        filter.notification_frequency_hours = hours;
        self.db.filter.update(&filter).await?;
        Ok(UpdateResult::Updated { filter })
    }

    /// # Performance
    /// * DB calls: 2
    pub async fn set_active(&self, filter_id: i64, active: bool) -> Result<UpdateResult, ServiceError> {
        let Some(mut filter) = self.db.filter.select(filter_id).await? else {
            return Ok(UpdateResult::NotFound);
        };
        filter.is_active = active;
        self.db.filter.update(&filter).await?;
        Ok(UpdateResult::Updated { filter })
    }

    /// # Performance
    /// * DB calls: 2
    pub async fn set_notifications(
        &self,
        filter_id: i64,
        enabled: bool,
    ) -> Result<UpdateResult, ServiceError> {
        let Some(mut filter) = self.db.filter.select(filter_id).await? else {
            return Ok(UpdateResult::NotFound);
        };
        filter.notification_enabled = enabled;
        self.db.filter.update(&filter).await?;
        Ok(UpdateResult::Updated { filter })
    }

    /// # Performance
    /// * DB calls: 1
    pub async fn filters_for_user(&self, user_id: i64) -> Result<Vec<FilterModel>, ServiceError> {
        Ok(self.db.filter.select_all_by_user_id(user_id).await?)
    }

    /// # Performance
    /// * DB calls: 1
    pub async fn delete(&self, filter_id: i64) -> Result<(), ServiceError> {
        self.db.filter.delete(filter_id).await?;
        Ok(())
    }
}

fn validate_frequency(hours: i64) -> Result<(), ServiceError> {
    if !(MIN_FREQUENCY_HOURS..=MAX_FREQUENCY_HOURS).contains(&hours) {
        return Err(ServiceError::Validation {
            message: format!(
                "notification_frequency_hours must be within [{MIN_FREQUENCY_HOURS}, {MAX_FREQUENCY_HOURS}], got {hours}"
            ),
        });
    }
    Ok(())
}

fn validate_criteria(criteria: &FilterCriteria) -> Result<(), ServiceError> {
    if !criteria.is_consistent() {
        return Err(ServiceError::Validation {
            message: "range criteria must satisfy min <= max".to_string(),
        });
    }
    Ok(())
}

/// Outcome of a filter mutation.
#[derive(Debug)]
pub enum UpdateResult {
    Updated { filter: FilterModel },
    NotFound,
}
