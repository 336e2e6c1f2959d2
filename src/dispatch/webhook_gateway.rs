use log::debug;
use log::warn;

use super::DispatchError;
use super::DispatchGateway;
use super::EnqueueResult;
use crate::model::DispatchRequest;

/// Gateway that posts delivery requests as JSON to an external queue
/// endpoint. Any non-2xx response is a rejection; the cycle leaves the
/// pair unrecorded so it is retried later.
pub struct WebhookDispatchGateway {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatchGateway {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl DispatchGateway for WebhookDispatchGateway {
    async fn enqueue(&self, request: &DispatchRequest) -> Result<EnqueueResult, DispatchError> {
        debug!(
            "Enqueuing dispatch for user {} listing {}.",
            request.user_id, request.listing_id
        );
        let response = self.client.post(&self.url).json(request).send().await?;

        if response.status().is_success() {
            Ok(EnqueueResult::Accepted)
        } else {
            warn!(
                "Dispatch endpoint rejected user {} listing {} with status {}.",
                request.user_id,
                request.listing_id,
                response.status()
            );
            Ok(EnqueueResult::Rejected)
        }
    }
}
