//! Error types for the transition engine.

use thiserror::Error;

/// Why a transition request did not change the order.
///
/// Every variant leaves the local store exactly as it was.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    /// The target is not one of the five transition actions. No remote call was made.
    #[error("Invalid target status: {0}")]
    InvalidTargetStatus(String),

    /// The order is not in the local store.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The pipeline declined the transition, e.g. the order is not in the
    /// state the stage expects.
    #[error("Transition rejected for order {order_id}: {reason}")]
    RemoteRejected { order_id: String, reason: String },

    /// The request could not complete.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Another transition for this order is still waiting for the pipeline.
    #[error("A transition for order {0} is already in flight")]
    TransitionInFlight(String),
}
