use crate::domain::OrderStatus;
use std::fmt;
use tracing::warn;

/// Which slice of the order collection the dashboard is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Parses a filter value coming from the UI.
    ///
    /// `all`, `todos` and the empty string select everything. An unrecognized
    /// value also selects everything: a typo must never hide orders.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed.eq_ignore_ascii_case("todos")
        {
            return StatusFilter::All;
        }
        match OrderStatus::from_wire(trimmed) {
            Some(status) => StatusFilter::Only(status),
            None => {
                warn!(filter = raw, "Unrecognized status filter, showing all orders");
                StatusFilter::All
            }
        }
    }

    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl From<OrderStatus> for StatusFilter {
    fn from(status: OrderStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}
