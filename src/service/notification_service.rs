//! Eligibility, throttling and dispatch for one notification cycle.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::dispatch::DispatchGateway;
use crate::dispatch::EnqueueResult;
use crate::matcher;
use crate::model::DispatchRequest;
use crate::model::FilterModel;
use crate::repository::Repository;
use crate::service::error::ServiceError;

/// Service that runs the periodic matching-and-notification pass.
pub struct NotificationService {
    db: Arc<Repository>,
    gateway: Arc<dyn DispatchGateway>,
    /// Candidate window for filters that have never been notified.
    lookback: Duration,
}

impl NotificationService {
    pub fn new(db: Arc<Repository>, gateway: Arc<dyn DispatchGateway>, lookback: Duration) -> Self {
        Self {
            db,
            gateway,
            lookback,
        }
    }

    /// Runs one full cycle at the given instant.
    ///
    /// For every eligible filter: pull candidates, evaluate, dedup
    /// against the delivery ledger, enqueue, and record. The ledger row
    /// is written only after a confirmed enqueue, so a crash in between
    /// leaves no partial record and the pair is re-delivered later
    /// (at-least-once fallback). The filter enters its cooldown exactly
    /// once per cycle, match count or not.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, ServiceError> {
        let due = self.db.filter.select_due(now).await?;
        debug!("Notification cycle: {} filters due.", due.len());

        let mut report = CycleReport {
            filters_processed: due.len(),
            ..Default::default()
        };

        for filter in due {
            self.process_filter(&filter, now, &mut report).await?;
            self.db
                .filter
                .set_last_notification_sent(filter.id, now)
                .await?;
        }

        if report.dispatched > 0 {
            info!(
                "Notification cycle done: {} dispatched, {} duplicates skipped, {} rejected.",
                report.dispatched, report.duplicates_skipped, report.rejected
            );
        }
        Ok(report)
    }

    async fn process_filter(
        &self,
        filter: &FilterModel,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<(), ServiceError> {
        let since = filter.last_notification_sent.unwrap_or(now - self.lookback);
        let candidates = self.db.listing.select_candidates(since).await?;
        report.candidates_evaluated += candidates.len();

        for listing in candidates {
            if !matcher::matches(&filter.criteria.0, &listing) {
                continue;
            }
            report.matched += 1;

            // One notification per (user, listing), no matter how many
            // of the user's filters match or in which cycle.
            if self
                .db
                .delivery_record
                .exists(filter.user_id, listing.id)
                .await?
            {
                report.duplicates_skipped += 1;
                continue;
            }

            let Some(user) = self.db.user.select(filter.user_id).await? else {
                warn!(
                    "Filter {} owner {} has no user record; skipping listing {}.",
                    filter.id, filter.user_id, listing.id
                );
                report.rejected += 1;
                continue;
            };

            let request = DispatchRequest {
                user_id: filter.user_id,
                listing_id: listing.id,
                filter_id: filter.id,
                channel_preferences: user.channel_preferences.0,
            };

            match self.gateway.enqueue(&request).await {
                Ok(EnqueueResult::Accepted) => {
                    let inserted = self
                        .db
                        .delivery_record
                        .insert_once(filter.user_id, listing.id, Some(filter.id), now)
                        .await?;
                    if inserted {
                        report.dispatched += 1;
                    } else {
                        // A concurrent cycle won the race; the unique
                        // constraint kept the ledger at one row.
                        report.duplicates_skipped += 1;
                    }
                }
                Ok(EnqueueResult::Rejected) => {
                    report.rejected += 1;
                }
                Err(e) => {
                    // Non-fatal: no record, the pair stays eligible for
                    // a later cycle; remaining matches proceed.
                    error!(
                        "Dispatch enqueue failed for user {} listing {}: {e}",
                        filter.user_id, listing.id
                    );
                    report.rejected += 1;
                }
            }
        }

        Ok(())
    }
}

/// Counters for one notification cycle, logged by the cycle task.
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleReport {
    pub filters_processed: usize,
    pub candidates_evaluated: usize,
    pub matched: usize,
    pub dispatched: usize,
    pub duplicates_skipped: usize,
    pub rejected: usize,
}
