//! Implementations of the [`OrderPipeline`] transport seam.
//!
//! - [`HttpPipeline`] talks to the employee, customer and analytics services.
//! - [`InMemoryPipeline`] applies the workflow rules locally; the demo binary
//!   and the integration tests run against it.
//! - [`mock::MockPipeline`] replays scripted answers and checks the calls made.

pub mod http;
pub mod memory;
pub mod mock;
pub mod pipeline;

pub use http::*;
pub use memory::*;
pub use pipeline::*;
