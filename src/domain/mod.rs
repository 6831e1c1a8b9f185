//! Pure data structures shared by the store, the transition engine and the aggregator.

pub mod order;
pub mod session;
pub mod status;

pub use order::*;
pub use session::*;
pub use status::*;
