//! Error types for the dashboard session.

use crate::clients::PipelineError;
use crate::transition::TransitionError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    /// The session handed over by the login flow is not authenticated.
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// Analytics were requested by a regular employee.
    #[error("Analytics are only available to administrators")]
    AdminOnly,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The background refresher panicked.
    #[error("Refresher task failed: {0}")]
    Refresher(String),
}
