//! Analytics aggregation over the order collection.
//!
//! [`aggregate`] is a pure function: the same orders in the same order always
//! produce the same [`AnalyticsSnapshot`], and nothing is cached between
//! calls. Callers recompute after every reload and every applied transition.

use crate::domain::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Point-in-time summary of a set of orders.
///
/// Rates are ratios in `[0, 1]`; use the `*_percent` helpers for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total: usize,
    /// Count per status. Always holds all seven states.
    pub by_status: BTreeMap<OrderStatus, usize>,
    /// Sum of `total` over delivered orders.
    pub delivered_revenue: Decimal,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    /// Delivered revenue per delivered order.
    pub average_revenue: Decimal,
}

/// Derives the snapshot for `orders`. Never fails; an empty input gives all zeros
/// and delivered revenue saturates at [`Decimal::MAX`].
pub fn aggregate<'a, I>(orders: I) -> AnalyticsSnapshot
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut by_status: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
    let mut total = 0usize;
    let mut delivered_revenue = Decimal::ZERO;

    for order in orders {
        total += 1;
        *by_status.entry(order.status).or_insert(0) += 1;
        if order.status == OrderStatus::Entregado {
            delivered_revenue = delivered_revenue
                .checked_add(order.total())
                .unwrap_or_else(|| {
                    warn!(order_id = %order.order_id, "Delivered revenue overflowed, saturating");
                    Decimal::MAX
                });
        }
    }

    let delivered = by_status[&OrderStatus::Entregado];
    let cancelled = by_status[&OrderStatus::Cancelado];
    let average_revenue = if delivered == 0 {
        Decimal::ZERO
    } else {
        delivered_revenue
            .checked_div(Decimal::from(delivered))
            .unwrap_or(Decimal::ZERO)
    };

    AnalyticsSnapshot {
        total,
        by_status,
        delivered_revenue,
        completion_rate: ratio(delivered, total),
        cancellation_rate: ratio(cancelled, total),
        average_revenue,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl AnalyticsSnapshot {
    pub fn count(&self, status: OrderStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn delivered(&self) -> usize {
        self.count(OrderStatus::Entregado)
    }

    pub fn cancelled(&self) -> usize {
        self.count(OrderStatus::Cancelado)
    }

    /// Orders anywhere between the kitchen and the customer's door.
    pub fn in_progress(&self) -> usize {
        self.in_kitchen() + self.count(OrderStatus::EnDelivery)
    }

    /// Orders being prepared, cooked or packed.
    pub fn in_kitchen(&self) -> usize {
        self.count(OrderStatus::EnPreparacion)
            + self.count(OrderStatus::EnCocina)
            + self.count(OrderStatus::Empaquetado)
    }

    pub fn completion_percent(&self) -> f64 {
        self.completion_rate * 100.0
    }

    pub fn cancellation_percent(&self) -> f64 {
        self.cancellation_rate * 100.0
    }

    /// Percentage of all orders sitting in `status`.
    pub fn share(&self, status: OrderStatus) -> f64 {
        ratio(self.count(status), self.total) * 100.0
    }
}

/// Per-location figures reported by the remote analytics service.
///
/// These come from the warehouse queries and are independent of the local
/// [`AnalyticsSnapshot`]; they may lag or lead the polled orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationKpis {
    pub local_id: String,
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub revenue_total: Decimal,
    pub revenue_average: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, status: OrderStatus, total: i64) -> Order {
        Order::new(id, status, Decimal::from(total))
    }

    #[test]
    fn test_empty_input_yields_zeros() {
        let snapshot = aggregate(&Vec::<Order>::new());
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.completion_rate, 0.0);
        assert_eq!(snapshot.cancellation_rate, 0.0);
        assert_eq!(snapshot.average_revenue, Decimal::ZERO);
        assert_eq!(snapshot.by_status.len(), 7);
        assert!(snapshot.by_status.values().all(|count| *count == 0));
    }

    #[test]
    fn test_pending_and_delivered_scenario() {
        let orders = vec![
            order("1", OrderStatus::Pendiente, 10),
            order("2", OrderStatus::Entregado, 20),
        ];
        let snapshot = aggregate(&orders);

        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.delivered(), 1);
        assert_eq!(snapshot.count(OrderStatus::Pendiente), 1);
        assert_eq!(snapshot.completion_percent(), 50.0);
        assert_eq!(snapshot.delivered_revenue, Decimal::from(20));
        assert_eq!(snapshot.average_revenue, Decimal::from(20));
    }

    #[test]
    fn test_cancellation_rate_and_groupings() {
        let orders = vec![
            order("1", OrderStatus::Cancelado, 5),
            order("2", OrderStatus::EnCocina, 5),
            order("3", OrderStatus::EnDelivery, 5),
            order("4", OrderStatus::Cancelado, 5),
        ];
        let snapshot = aggregate(&orders);

        assert_eq!(snapshot.cancellation_rate, 0.5);
        assert_eq!(snapshot.in_kitchen(), 1);
        assert_eq!(snapshot.in_progress(), 2);
        assert_eq!(snapshot.share(OrderStatus::Cancelado), 50.0);
        // Cancelled orders never count as revenue.
        assert_eq!(snapshot.delivered_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_huge_delivered_totals_saturate() {
        let records = [
            serde_json::json!({"pedido_id": "1", "estado": "entregado", "total": "79228162514264337593543950335"}),
            serde_json::json!({"pedido_id": "2", "estado": "entregado", "total": "79228162514264337593543950335"}),
            serde_json::json!({"pedido_id": "3", "estado": "pendiente", "total": "1"}),
        ];
        let orders = Order::decode_all(&records);
        assert_eq!(orders.len(), 3);

        let snapshot = aggregate(&orders);

        assert_eq!(snapshot.delivered(), 2);
        assert_eq!(snapshot.delivered_revenue, Decimal::MAX);
        assert_eq!(snapshot.average_revenue, Decimal::MAX / Decimal::from(2));
        assert_eq!(snapshot.completion_rate, 2.0 / 3.0);
    }

    #[test]
    fn test_permuting_input_keeps_totals() {
        let mut orders = vec![
            order("1", OrderStatus::Entregado, 7),
            order("2", OrderStatus::Pendiente, 3),
            order("3", OrderStatus::Entregado, 11),
            order("4", OrderStatus::Cancelado, 2),
        ];
        let forward = aggregate(&orders);
        orders.reverse();
        let backward = aggregate(&orders);

        assert_eq!(forward, backward);
        assert_eq!(forward.average_revenue, Decimal::from(9));
    }
}
