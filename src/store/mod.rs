//! Locally cached order collection.
//!
//! [`OrderStore`] is the single owner of the orders a dashboard session has
//! seen. It is replaced wholesale by [`OrderStore::replace_all`] on every
//! reload; the only in-place mutation is the status write performed by the
//! [`TransitionEngine`](crate::transition::TransitionEngine) after the remote
//! pipeline confirmed a transition.

pub mod filter;

pub use filter::*;

use crate::domain::{Order, OrderStatus};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// The store as shared between the dashboard, its refresher and the engine.
///
/// Guards are never held across an `.await`.
pub type SharedStore = RwLock<OrderStore>;

pub(crate) fn read_store(store: &SharedStore) -> RwLockReadGuard<'_, OrderStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_store(store: &SharedStore) -> RwLockWriteGuard<'_, OrderStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// Orders keyed by id, remembering the order in which they arrived.
#[derive(Debug, Default, Clone)]
pub struct OrderStore {
    orders: Vec<Order>,
    index: HashMap<String, usize>,
    filter: StatusFilter,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store already holding `orders`.
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut store = Self::new();
        store.replace_all(orders);
        store
    }

    /// Replaces the entire collection.
    ///
    /// When the batch repeats an id, the later record wins but keeps the
    /// position of the first one. The active filter is kept.
    pub fn replace_all(&mut self, orders: impl IntoIterator<Item = Order>) {
        self.orders.clear();
        self.index.clear();
        for order in orders {
            match self.index.get(&order.order_id) {
                Some(&position) => self.orders[position] = order,
                None => {
                    self.index.insert(order.order_id.clone(), self.orders.len());
                    self.orders.push(order);
                }
            }
        }
        debug!(count = self.orders.len(), "Order store reloaded");
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.index.get(order_id).map(|&position| &self.orders[position])
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.index.contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// All orders in insertion order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Derives a view: matching orders, newest first.
    ///
    /// Orders without a creation timestamp sort after all dated ones. Ties
    /// keep insertion order (the sort is stable).
    pub fn apply_filter(&self, filter: StatusFilter) -> Vec<&Order> {
        let mut view: Vec<&Order> = self
            .orders
            .iter()
            .filter(|order| filter.matches(order.status))
            .collect();
        view.sort_by_key(|order| Reverse(order.created_at));
        view
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// The view for the active filter.
    pub fn view(&self) -> Vec<&Order> {
        self.apply_filter(self.filter)
    }

    /// Writes a confirmed status. Returns `false` when the order is unknown.
    pub(crate) fn set_status(&mut self, order_id: &str, status: OrderStatus) -> bool {
        match self.index.get(order_id) {
            Some(&position) => {
                self.orders[position].status = status;
                true
            }
            None => false,
        }
    }

    /// Drops every order and resets the filter.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.index.clear();
        self.filter = StatusFilter::All;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn order_at(id: &str, status: OrderStatus, hour: Option<u32>) -> Order {
        let order = Order::new(id, status, Decimal::ONE);
        match hour {
            Some(h) => order.with_created_at(Utc.with_ymd_and_hms(2025, 1, 1, h, 0, 0).unwrap()),
            None => order,
        }
    }

    fn ids<'a>(view: &[&'a Order]) -> Vec<&'a str> {
        view.iter().map(|o| o.order_id.as_str()).collect()
    }

    #[test]
    fn test_view_is_sorted_newest_first_with_stable_ties() {
        let store = OrderStore::with_orders(vec![
            order_at("a", OrderStatus::Pendiente, Some(8)),
            order_at("b", OrderStatus::Pendiente, None),
            order_at("c", OrderStatus::Pendiente, Some(10)),
            order_at("d", OrderStatus::Pendiente, Some(8)),
        ]);

        assert_eq!(ids(&store.apply_filter(StatusFilter::All)), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn test_filter_does_not_touch_collection() {
        let store = OrderStore::with_orders(vec![
            order_at("a", OrderStatus::Entregado, Some(1)),
            order_at("b", OrderStatus::Pendiente, Some(2)),
        ]);

        let delivered = store.apply_filter(StatusFilter::Only(OrderStatus::Entregado));
        assert_eq!(ids(&delivered), vec!["a"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_keep_last_record_at_first_position() {
        let store = OrderStore::with_orders(vec![
            order_at("a", OrderStatus::Pendiente, None),
            order_at("b", OrderStatus::Pendiente, None),
            order_at("a", OrderStatus::Empaquetado, None),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.orders()[0].order_id, "a");
        assert_eq!(store.get("a").unwrap().status, OrderStatus::Empaquetado);
    }

    #[test]
    fn test_replace_all_discards_previous_orders() {
        let mut store = OrderStore::with_orders(vec![order_at("old", OrderStatus::Pendiente, None)]);
        store.replace_all(vec![order_at("new", OrderStatus::Pendiente, None)]);

        assert!(store.get("old").is_none());
        assert!(store.contains("new"));
    }

    #[test]
    fn test_active_filter_drives_view() {
        let mut store = OrderStore::with_orders(vec![
            order_at("a", OrderStatus::Cancelado, None),
            order_at("b", OrderStatus::Pendiente, None),
        ]);
        store.set_filter(StatusFilter::parse("cancelado"));
        assert_eq!(ids(&store.view()), vec!["a"]);

        store.set_filter(StatusFilter::parse("no-such-status"));
        assert_eq!(store.view().len(), 2);
    }

    #[test]
    fn test_set_status_reports_unknown_order() {
        let mut store = OrderStore::with_orders(vec![order_at("a", OrderStatus::Pendiente, None)]);
        assert!(store.set_status("a", OrderStatus::EnPreparacion));
        assert!(!store.set_status("zzz", OrderStatus::EnPreparacion));
        assert_eq!(store.get("a").unwrap().status, OrderStatus::EnPreparacion);
    }
}
