//! The transport seam between the dashboard core and the backend services.

use crate::analytics::LocationKpis;
use crate::domain::Order;
use crate::transition::TransitionAction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a pipeline implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// The backend understood the request and declined it.
    #[error("Rejected by pipeline: {0}")]
    Rejected(String),

    /// The request did not complete (connection, timeout, server failure).
    #[error("Pipeline unreachable: {0}")]
    Network(String),

    /// The backend does not know the requested order.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a payload that could not be read.
    #[error("Malformed pipeline response: {0}")]
    Decode(String),
}

/// Success payload of a transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionReceipt {
    /// Confirmation text from the backend, if any.
    pub message: Option<String>,
}

/// Remote operations the dashboard depends on.
///
/// Every call is fail-capable and awaited; implementations never retry.
#[async_trait]
pub trait OrderPipeline: Send + Sync {
    /// Sends one stage action for one order on behalf of `actor_id`.
    async fn submit_transition(
        &self,
        action: TransitionAction,
        order_id: &str,
        actor_id: &str,
    ) -> Result<TransitionReceipt, PipelineError>;

    /// Lists the orders of the configured location.
    async fn fetch_orders(&self) -> Result<Vec<Order>, PipelineError>;

    /// Looks up a single order.
    async fn fetch_order_status(&self, order_id: &str) -> Result<Order, PipelineError>;

    /// Per-location KPIs computed by the analytics service.
    async fn fetch_location_kpis(&self) -> Result<LocationKpis, PipelineError>;
}
