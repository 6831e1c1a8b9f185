//! # Mock Pipeline
//!
//! Scripted [`OrderPipeline`] for testing the engine and the dashboard
//! without a backend.
//!
//! Queue expectations with the `expect_*` builders, hand the mock (or a clone
//! of it) to the code under test, then call [`MockPipeline::verify`]. Calls
//! must arrive in the order the expectations were queued.
//!
//! ```ignore
//! let mock = MockPipeline::new();
//! mock.expect_fetch_orders().return_ok(vec![order]);
//! mock.expect_transition(TransitionAction::StartKitchen, "1")
//!     .return_ok(TransitionReceipt::default());
//!
//! let dashboard = Dashboard::start(session, Arc::new(mock.clone()))?;
//! // ...
//! mock.verify();
//! ```

use super::{OrderPipeline, PipelineError, TransitionReceipt};
use crate::analytics::LocationKpis;
use crate::domain::Order;
use crate::transition::TransitionAction;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type TransitionResult = Result<TransitionReceipt, PipelineError>;

/// How a queued expectation answers.
enum Reply<T> {
    Ready(Result<T, PipelineError>),
    /// Answers once the test sends on the paired sender.
    Deferred(oneshot::Receiver<Result<T, PipelineError>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, PipelineError> {
        match self {
            Reply::Ready(result) => result,
            Reply::Deferred(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(PipelineError::Network("mock responder dropped".into()))),
        }
    }
}

enum Expectation {
    Transition {
        action: TransitionAction,
        order_id: String,
        reply: Reply<TransitionReceipt>,
    },
    FetchOrders {
        reply: Reply<Vec<Order>>,
    },
    FetchOrderStatus {
        order_id: String,
        reply: Reply<Order>,
    },
    LocationKpis {
        reply: Reply<LocationKpis>,
    },
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Transition { action, order_id, .. } => {
                format!("submit_transition({action}, {order_id})")
            }
            Expectation::FetchOrders { .. } => "fetch_orders()".into(),
            Expectation::FetchOrderStatus { order_id, .. } => {
                format!("fetch_order_status({order_id})")
            }
            Expectation::LocationKpis { .. } => "fetch_location_kpis()".into(),
        }
    }
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<Expectation>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A pipeline that answers from a queue of expectations.
///
/// Clones share the same queue and call counter.
#[derive(Clone, Default)]
pub struct MockPipeline {
    expectations: Queue,
    calls: Arc<AtomicUsize>,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pipeline calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Expects a `submit_transition` for `action` on `order_id`.
    pub fn expect_transition(
        &self,
        action: TransitionAction,
        order_id: impl Into<String>,
    ) -> TransitionExpectationBuilder {
        TransitionExpectationBuilder {
            action,
            order_id: order_id.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `fetch_orders` call.
    pub fn expect_fetch_orders(&self) -> ReplyBuilder<Vec<Order>> {
        ReplyBuilder {
            expectations: self.expectations.clone(),
            wrap: Box::new(|reply| Expectation::FetchOrders { reply }),
        }
    }

    /// Expects a `fetch_order_status` call for `order_id`.
    pub fn expect_fetch_order_status(&self, order_id: impl Into<String>) -> ReplyBuilder<Order> {
        let order_id = order_id.into();
        ReplyBuilder {
            expectations: self.expectations.clone(),
            wrap: Box::new(move |reply| Expectation::FetchOrderStatus { order_id, reply }),
        }
    }

    /// Expects a `fetch_location_kpis` call.
    pub fn expect_location_kpis(&self) -> ReplyBuilder<LocationKpis> {
        ReplyBuilder {
            expectations: self.expectations.clone(),
            wrap: Box::new(|reply| Expectation::LocationKpis { reply }),
        }
    }

    /// Panics if queued expectations were never consumed.
    pub fn verify(&self) {
        let exps = lock(&self.expectations);
        if !exps.is_empty() {
            let pending: Vec<_> = exps.iter().map(Expectation::describe).collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                exps.len(),
                pending
            );
        }
    }

    fn next(&self, call: &str) -> Expectation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.expectations).pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected call with no expectation queued: {call}"),
        }
    }
}

/// Builder for `submit_transition` expectations.
pub struct TransitionExpectationBuilder {
    action: TransitionAction,
    order_id: String,
    expectations: Queue,
}

impl TransitionExpectationBuilder {
    pub fn return_ok(self, receipt: TransitionReceipt) {
        self.push(Reply::Ready(Ok(receipt)));
    }

    pub fn return_err(self, error: PipelineError) {
        self.push(Reply::Ready(Err(error)));
    }

    /// Holds the call open until the returned sender fires.
    pub fn return_deferred(self) -> oneshot::Sender<TransitionResult> {
        let (sender, receiver) = oneshot::channel();
        self.push(Reply::Deferred(receiver));
        sender
    }

    fn push(self, reply: Reply<TransitionReceipt>) {
        lock(&self.expectations).push_back(Expectation::Transition {
            action: self.action,
            order_id: self.order_id,
            reply,
        });
    }
}

/// Builder for the fetch expectations.
pub struct ReplyBuilder<T> {
    expectations: Queue,
    wrap: Box<dyn FnOnce(Reply<T>) -> Expectation + Send>,
}

impl<T> ReplyBuilder<T> {
    pub fn return_ok(self, value: T) {
        let expectation = (self.wrap)(Reply::Ready(Ok(value)));
        lock(&self.expectations).push_back(expectation);
    }

    pub fn return_err(self, error: PipelineError) {
        let expectation = (self.wrap)(Reply::Ready(Err(error)));
        lock(&self.expectations).push_back(expectation);
    }

    /// Holds the call open until the returned sender fires.
    pub fn return_deferred(self) -> oneshot::Sender<Result<T, PipelineError>> {
        let (sender, receiver) = oneshot::channel();
        let expectation = (self.wrap)(Reply::Deferred(receiver));
        lock(&self.expectations).push_back(expectation);
        sender
    }
}

#[async_trait]
impl OrderPipeline for MockPipeline {
    async fn submit_transition(
        &self,
        action: TransitionAction,
        order_id: &str,
        _actor_id: &str,
    ) -> Result<TransitionReceipt, PipelineError> {
        let call = format!("submit_transition({action}, {order_id})");
        match self.next(&call) {
            Expectation::Transition {
                action: expected_action,
                order_id: expected_id,
                reply,
            } if expected_action == action && expected_id == order_id => reply.resolve().await,
            other => panic!("Expected {}, got {call}", other.describe()),
        }
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, PipelineError> {
        match self.next("fetch_orders()") {
            Expectation::FetchOrders { reply } => reply.resolve().await,
            other => panic!("Expected {}, got fetch_orders()", other.describe()),
        }
    }

    async fn fetch_order_status(&self, order_id: &str) -> Result<Order, PipelineError> {
        let call = format!("fetch_order_status({order_id})");
        match self.next(&call) {
            Expectation::FetchOrderStatus {
                order_id: expected_id,
                reply,
            } if expected_id == order_id => reply.resolve().await,
            other => panic!("Expected {}, got {call}", other.describe()),
        }
    }

    async fn fetch_location_kpis(&self) -> Result<LocationKpis, PipelineError> {
        match self.next("fetch_location_kpis()") {
            Expectation::LocationKpis { reply } => reply.resolve().await,
            other => panic!("Expected {}, got fetch_location_kpis()", other.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_mock_replays_expectations_in_order() {
        let mock = MockPipeline::new();
        mock.expect_fetch_orders()
            .return_ok(vec![Order::new("1", OrderStatus::Pendiente, Decimal::ONE)]);
        mock.expect_transition(TransitionAction::StartKitchen, "1")
            .return_err(PipelineError::Rejected("nope".into()));

        let orders = mock.fetch_orders().await.unwrap();
        assert_eq!(orders.len(), 1);

        let result = mock
            .submit_transition(TransitionAction::StartKitchen, "1", "emp")
            .await;
        assert_eq!(result, Err(PipelineError::Rejected("nope".into())));

        assert_eq!(mock.call_count(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_deferred_reply_waits_for_sender() {
        let mock = MockPipeline::new();
        let responder = mock
            .expect_transition(TransitionAction::StartDelivery, "7")
            .return_deferred();

        let call = {
            let mock = mock.clone();
            tokio::spawn(async move {
                mock.submit_transition(TransitionAction::StartDelivery, "7", "emp")
                    .await
            })
        };

        responder
            .send(Ok(TransitionReceipt {
                message: Some("ok".into()),
            }))
            .unwrap();
        let receipt = call.await.unwrap().unwrap();
        assert_eq!(receipt.message.as_deref(), Some("ok"));
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_reports_unused_expectations() {
        let mock = MockPipeline::new();
        mock.expect_location_kpis().return_ok(LocationKpis::default());
        mock.verify();
    }
}
