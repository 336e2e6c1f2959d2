//! Dispatch gateway boundary.
//!
//! The core produces delivery requests and records the ledger entry
//! only after the gateway confirms the enqueue. It never retries a
//! rejection itself; an unrecorded pair is simply picked up again by a
//! later cycle.

pub mod log_gateway;
pub mod webhook_gateway;

pub use log_gateway::LogDispatchGateway;
pub use webhook_gateway::WebhookDispatchGateway;

use crate::model::DispatchRequest;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("Dispatch transport error: {0}")]
    TransportError(#[from] reqwest::Error),
}

/// Outcome of handing a request to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    Accepted,
    Rejected,
}

#[async_trait::async_trait]
pub trait DispatchGateway: Send + Sync {
    async fn enqueue(&self, request: &DispatchRequest) -> Result<EnqueueResult, DispatchError>;
}
