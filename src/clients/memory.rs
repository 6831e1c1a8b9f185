use super::{OrderPipeline, PipelineError, TransitionReceipt};
use crate::analytics::{aggregate, LocationKpis};
use crate::domain::{Order, OrderStatus};
use crate::transition::TransitionAction;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

/// A transition as it reached the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub action: TransitionAction,
    pub order_id: String,
    pub actor_id: String,
}

/// Pipeline that keeps the authoritative orders in memory.
///
/// It enforces the same rules as the backend workflow: a stage is accepted
/// only from the state right before it, and terminal orders accept nothing.
/// Cancellation is a pipeline-side decision, exposed through [`Self::cancel`].
pub struct InMemoryPipeline {
    local_id: String,
    orders: Mutex<Vec<Order>>,
    submissions: Mutex<Vec<Submission>>,
    offline: AtomicBool,
}

impl InMemoryPipeline {
    pub fn new(local_id: impl Into<String>, orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            local_id: local_id.into(),
            orders: Mutex::new(orders.into_iter().collect()),
            submissions: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Adds an order, replacing any order with the same id.
    pub fn insert(&self, order: Order) {
        let mut orders = self.orders();
        match orders.iter_mut().find(|o| o.order_id == order.order_id) {
            Some(existing) => *existing = order,
            None => orders.push(order),
        }
    }

    /// Cancels a non-terminal order. Returns `false` if it is unknown or terminal.
    pub fn cancel(&self, order_id: &str) -> bool {
        let mut orders = self.orders();
        match orders.iter_mut().find(|o| o.order_id == order_id) {
            Some(order) if !order.status.is_terminal() => {
                order.status = OrderStatus::Cancelado;
                true
            }
            _ => false,
        }
    }

    /// Makes every following call fail with [`PipelineError::Network`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every transition received so far, accepted or not.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn orders(&self) -> MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), PipelineError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PipelineError::Network("pipeline is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderPipeline for InMemoryPipeline {
    #[instrument(skip(self))]
    async fn submit_transition(
        &self,
        action: TransitionAction,
        order_id: &str,
        actor_id: &str,
    ) -> Result<TransitionReceipt, PipelineError> {
        self.ensure_online()?;
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Submission {
                action,
                order_id: order_id.to_string(),
                actor_id: actor_id.to_string(),
            });

        let mut orders = self.orders();
        let order = orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| PipelineError::NotFound(order_id.to_string()))?;

        if order.status.is_terminal() {
            return Err(PipelineError::Rejected(format!(
                "Order {order_id} is already {}",
                order.status
            )));
        }
        if order.status != action.required_status() {
            return Err(PipelineError::Rejected(format!(
                "Order {order_id} is {}, {action} requires {}",
                order.status,
                action.required_status()
            )));
        }

        order.status = action.resulting_status();
        debug!(status = %order.status, "Workflow advanced");
        Ok(TransitionReceipt {
            message: Some(format!("Order {order_id} is now {}", order.status)),
        })
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, PipelineError> {
        self.ensure_online()?;
        Ok(self.orders().clone())
    }

    async fn fetch_order_status(&self, order_id: &str) -> Result<Order, PipelineError> {
        self.ensure_online()?;
        self.orders()
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(order_id.to_string()))
    }

    async fn fetch_location_kpis(&self) -> Result<LocationKpis, PipelineError> {
        self.ensure_online()?;
        let snapshot = aggregate(self.orders().iter());
        Ok(LocationKpis {
            local_id: self.local_id.clone(),
            total_orders: snapshot.total as u64,
            delivered_orders: snapshot.delivered() as u64,
            revenue_total: snapshot.delivered_revenue,
            revenue_average: snapshot.average_revenue,
        })
    }
}
