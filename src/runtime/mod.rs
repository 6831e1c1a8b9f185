//! Session runtime and observability.
//!
//! - [`Dashboard`] - owns the order store for one signed-in employee, wires
//!   the transition engine and the aggregator, and runs the polling refresher
//! - [`setup_tracing`] - initializes the tracing subscriber

pub mod dashboard;
pub mod error;
pub mod tracing;

pub use dashboard::*;
pub use error::*;
pub use self::tracing::setup_tracing;
