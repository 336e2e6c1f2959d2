use log::info;

use super::DispatchError;
use super::DispatchGateway;
use super::EnqueueResult;
use crate::model::DispatchRequest;

/// Fallback gateway used when no dispatch endpoint is configured.
/// Accepts everything and only logs, which still exercises the full
/// ledger path.
pub struct LogDispatchGateway;

#[async_trait::async_trait]
impl DispatchGateway for LogDispatchGateway {
    async fn enqueue(&self, request: &DispatchRequest) -> Result<EnqueueResult, DispatchError> {
        info!(
            "Dispatch (log only): user {} listing {} via filter {}.",
            request.user_id, request.listing_id, request.filter_id
        );
        Ok(EnqueueResult::Accepted)
    }
}
