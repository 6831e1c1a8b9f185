//! Status transition engine.
//!
//! [`TransitionEngine::request_transition`] validates the target and the
//! order's current status locally, sends exactly one remote action to the
//! [`OrderPipeline`] and, only once the pipeline confirmed it, writes the
//! resulting status into the [`OrderStore`](crate::store::OrderStore).
//! Terminal orders are never written. The engine never retries and
//! never updates the store optimistically.

pub mod actions;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::{OrderPipeline, PipelineError};
use crate::domain::{Order, OrderStatus};
use crate::store::{read_store, write_store, SharedStore};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Issues transitions against a pipeline and reconciles the local store.
pub struct TransitionEngine<P: OrderPipeline> {
    pipeline: Arc<P>,
    in_flight: Mutex<HashSet<String>>,
}

impl<P: OrderPipeline> TransitionEngine<P> {
    pub fn new(pipeline: Arc<P>) -> Self {
        Self {
            pipeline,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<P> {
        &self.pipeline
    }

    /// Whether a transition for `order_id` is waiting on the pipeline.
    pub fn is_in_flight(&self, order_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(order_id)
    }

    /// Moves one order to `target` through the remote pipeline.
    ///
    /// # Errors
    /// - [`TransitionError::InvalidTargetStatus`] if `target` is not one of the
    ///   five transition actions (checked before anything else)
    /// - [`TransitionError::NotFound`] if the order is not in the store
    /// - [`TransitionError::RemoteRejected`] if the stored order is already
    ///   `entregado` or `cancelado`; the pipeline is not called
    /// - [`TransitionError::TransitionInFlight`] if this order already has a
    ///   pending request
    /// - [`TransitionError::RemoteRejected`] / [`TransitionError::NetworkFailure`]
    ///   as reported by the pipeline
    ///
    /// On every error path the store is left untouched.
    #[instrument(skip(self, store))]
    pub async fn request_transition(
        &self,
        store: &SharedStore,
        order_id: &str,
        target: &str,
        actor_id: &str,
    ) -> Result<Order, TransitionError> {
        let action: TransitionAction = target.parse()?;

        let current = read_store(store)
            .get(order_id)
            .map(|order| order.status)
            .ok_or_else(|| TransitionError::NotFound(order_id.to_string()))?;
        if current.is_terminal() {
            return Err(terminal_rejection(order_id, current));
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, order_id)
            .ok_or_else(|| TransitionError::TransitionInFlight(order_id.to_string()))?;

        debug!(%action, "Submitting transition");
        let receipt = self
            .pipeline
            .submit_transition(action, order_id, actor_id)
            .await
            .map_err(|e| remote_error(order_id, e))?;

        let mut store = write_store(store);
        match store.get(order_id).map(|order| order.status) {
            // A reload dropped the order while the request was pending.
            None => {
                warn!("Transition confirmed for an order no longer in the store");
                return Err(TransitionError::NotFound(order_id.to_string()));
            }
            // A reload observed a terminal state while the request was pending.
            Some(status) if status.is_terminal() => {
                warn!(%status, "Transition confirmed for an order that is already terminal");
                return Err(terminal_rejection(order_id, status));
            }
            Some(_) => {
                store.set_status(order_id, action.resulting_status());
            }
        }
        let updated = store
            .get(order_id)
            .cloned()
            .ok_or_else(|| TransitionError::NotFound(order_id.to_string()))?;

        info!(
            status = %updated.status,
            message = receipt.message.as_deref().unwrap_or_default(),
            "Transition applied"
        );
        Ok(updated)
    }
}

fn terminal_rejection(order_id: &str, status: OrderStatus) -> TransitionError {
    TransitionError::RemoteRejected {
        order_id: order_id.to_string(),
        reason: format!("Order {order_id} is already {status}"),
    }
}

fn remote_error(order_id: &str, error: PipelineError) -> TransitionError {
    match error {
        PipelineError::Rejected(reason) | PipelineError::NotFound(reason) => {
            TransitionError::RemoteRejected {
                order_id: order_id.to_string(),
                reason,
            }
        }
        PipelineError::Network(reason) | PipelineError::Decode(reason) => {
            TransitionError::NetworkFailure(reason)
        }
    }
}

/// Marks an order as in flight for as long as it lives.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    order_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, order_id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order_id.to_string());
        inserted.then(|| Self {
            set,
            order_id: order_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockPipeline;
    use crate::clients::TransitionReceipt;
    use crate::store::OrderStore;
    use rust_decimal::Decimal;
    use std::sync::RwLock;

    fn store_with(id: &str, status: OrderStatus) -> SharedStore {
        RwLock::new(OrderStore::with_orders(vec![Order::new(id, status, Decimal::TEN)]))
    }

    #[tokio::test]
    async fn test_invalid_target_makes_no_remote_call() {
        let mock = MockPipeline::new();
        let engine = TransitionEngine::new(Arc::new(mock.clone()));
        let store = store_with("1", OrderStatus::Pendiente);

        for target in ["cancelado", "en_cocina", "", "ENTREGADO"] {
            let result = engine.request_transition(&store, "1", target, "emp-1").await;
            assert_eq!(result, Err(TransitionError::InvalidTargetStatus(target.to_string())));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let mock = MockPipeline::new();
        let engine = TransitionEngine::new(Arc::new(mock.clone()));
        let store = store_with("1", OrderStatus::Pendiente);

        let result = engine.request_transition(&store, "2", "en_preparacion", "emp-1").await;
        assert_eq!(result, Err(TransitionError::NotFound("2".to_string())));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_confirmed_transition_updates_store() {
        let mock = MockPipeline::new();
        mock.expect_transition(TransitionAction::StartKitchen, "1")
            .return_ok(TransitionReceipt::default());
        let engine = TransitionEngine::new(Arc::new(mock.clone()));
        let store = store_with("1", OrderStatus::Pendiente);

        let updated = engine
            .request_transition(&store, "1", "en_preparacion", "emp-1")
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::EnPreparacion);
        assert_eq!(read_store(&store).get("1").unwrap().status, OrderStatus::EnPreparacion);
        assert!(!engine.is_in_flight("1"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_failures_leave_store_unchanged() {
        let mock = MockPipeline::new();
        mock.expect_transition(TransitionAction::CompleteKitchen, "1")
            .return_err(PipelineError::Rejected("order is pendiente".into()));
        mock.expect_transition(TransitionAction::CompleteKitchen, "1")
            .return_err(PipelineError::Network("timed out".into()));
        let engine = TransitionEngine::new(Arc::new(mock.clone()));
        let store = store_with("1", OrderStatus::Pendiente);

        let rejected = engine.request_transition(&store, "1", "cocina_completa", "emp-1").await;
        assert!(matches!(rejected, Err(TransitionError::RemoteRejected { .. })));

        let failed = engine.request_transition(&store, "1", "cocina_completa", "emp-1").await;
        assert_eq!(failed, Err(TransitionError::NetworkFailure("timed out".into())));

        assert_eq!(read_store(&store).get("1").unwrap().status, OrderStatus::Pendiente);
        assert!(!engine.is_in_flight("1"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_terminal_order_is_refused_before_the_pipeline() {
        for terminal in [OrderStatus::Entregado, OrderStatus::Cancelado] {
            let mock = MockPipeline::new();
            let engine = TransitionEngine::new(Arc::new(mock.clone()));
            let store = store_with("1", terminal);

            let result = engine.request_transition(&store, "1", "en_preparacion", "emp-1").await;

            assert_eq!(
                result,
                Err(TransitionError::RemoteRejected {
                    order_id: "1".into(),
                    reason: format!("Order 1 is already {terminal}"),
                })
            );
            assert_eq!(read_store(&store).get("1").unwrap().status, terminal);
            assert_eq!(mock.call_count(), 0);
        }
    }

    #[test]
    fn test_in_flight_guard_is_exclusive_per_order() {
        let set = Mutex::new(HashSet::new());
        let first = InFlightGuard::acquire(&set, "1");
        assert!(first.is_some());
        assert!(InFlightGuard::acquire(&set, "1").is_none());
        assert!(InFlightGuard::acquire(&set, "2").is_some());

        drop(first);
        assert!(InFlightGuard::acquire(&set, "1").is_some());
    }
}
