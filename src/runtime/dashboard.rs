use super::DashboardError;
use crate::analytics::{aggregate, AnalyticsSnapshot, LocationKpis};
use crate::clients::{OrderPipeline, PipelineError};
use crate::domain::{Order, Session};
use crate::store::{read_store, write_store, OrderStore, SharedStore, StatusFilter};
use crate::transition::TransitionEngine;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

/// One signed-in employee's view of the order pipeline.
///
/// `Dashboard` is responsible for:
/// - **Lifecycle**: the order store is created by [`Dashboard::start`],
///   replaced on every reload and torn down by [`Dashboard::shutdown`]
/// - **Wiring**: transitions go through the [`TransitionEngine`] with the
///   session's employee id
/// - **Derived state**: for admin sessions the [`AnalyticsSnapshot`] is
///   recomputed right after every store mutation
///
/// # Example
///
/// ```ignore
/// let mut dashboard = Dashboard::start(session, Arc::new(pipeline))?;
/// dashboard.reload().await?;
/// dashboard.spawn_refresher(config.poll_interval());
///
/// dashboard.request_transition("P-1", "en_preparacion").await?;
/// let snapshot = dashboard.analytics()?;
///
/// dashboard.shutdown().await?;
/// ```
pub struct Dashboard<P: OrderPipeline + 'static> {
    session: Session,
    state: Arc<DashboardState<P>>,
    refresher: Option<JoinHandle<()>>,
}

/// State shared with the refresher task.
struct DashboardState<P: OrderPipeline> {
    store: SharedStore,
    snapshot: RwLock<Option<AnalyticsSnapshot>>,
    engine: TransitionEngine<P>,
    analytics_enabled: bool,
}

impl<P: OrderPipeline> DashboardState<P> {
    async fn reload(&self) -> Result<usize, PipelineError> {
        let orders = self.engine.pipeline().fetch_orders().await?;
        Ok(self.replace_all(orders))
    }

    fn replace_all(&self, orders: Vec<Order>) -> usize {
        let mut store = write_store(&self.store);
        store.replace_all(orders);
        self.publish(&store);
        store.len()
    }

    /// Recomputes analytics from `store`; a no-op for regular employees.
    fn publish(&self, store: &OrderStore) {
        if !self.analytics_enabled {
            return;
        }
        let snapshot = aggregate(store.orders());
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn clear(&self) {
        write_store(&self.store).clear();
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<P: OrderPipeline + 'static> Dashboard<P> {
    /// Opens a dashboard for an authenticated session with an empty store.
    pub fn start(session: Session, pipeline: Arc<P>) -> Result<Self, DashboardError> {
        if !session.authenticated {
            return Err(DashboardError::NotAuthenticated);
        }

        let state = Arc::new(DashboardState {
            store: RwLock::new(OrderStore::new()),
            snapshot: RwLock::new(None),
            engine: TransitionEngine::new(pipeline),
            analytics_enabled: session.is_admin(),
        });
        state.publish(&read_store(&state.store));

        info!(actor_id = %session.actor_id, role = ?session.role, "Dashboard started");
        Ok(Self {
            session,
            state,
            refresher: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Replaces the store with the pipeline's current orders.
    ///
    /// On failure the previous orders stay in place.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<usize, DashboardError> {
        let count = self.state.reload().await?;
        info!(count, "Orders reloaded");
        Ok(count)
    }

    /// Replaces the store with orders obtained elsewhere.
    pub fn replace_all(&self, orders: Vec<Order>) -> usize {
        self.state.replace_all(orders)
    }

    /// Advances one order; see [`TransitionEngine::request_transition`].
    pub async fn request_transition(
        &self,
        order_id: &str,
        target: &str,
    ) -> Result<Order, DashboardError> {
        let updated = self
            .state
            .engine
            .request_transition(&self.state.store, order_id, target, &self.session.actor_id)
            .await?;
        self.state.publish(&read_store(&self.state.store));
        Ok(updated)
    }

    /// Sets the active filter from a UI value and returns what it resolved to.
    pub fn set_filter(&self, raw: &str) -> StatusFilter {
        let filter = StatusFilter::parse(raw);
        write_store(&self.state.store).set_filter(filter);
        filter
    }

    pub fn filter(&self) -> StatusFilter {
        read_store(&self.state.store).filter()
    }

    /// Orders matching the active filter, newest first.
    pub fn view(&self) -> Vec<Order> {
        read_store(&self.state.store)
            .view()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        read_store(&self.state.store).get(order_id).cloned()
    }

    /// The latest analytics snapshot. Admin sessions only.
    pub fn analytics(&self) -> Result<AnalyticsSnapshot, DashboardError> {
        if !self.state.analytics_enabled {
            return Err(DashboardError::AdminOnly);
        }
        let cached = self
            .state
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(cached.unwrap_or_else(|| aggregate(read_store(&self.state.store).orders())))
    }

    /// Location KPIs from the analytics service. Admin sessions only.
    pub async fn location_kpis(&self) -> Result<LocationKpis, DashboardError> {
        if !self.state.analytics_enabled {
            return Err(DashboardError::AdminOnly);
        }
        Ok(self.state.engine.pipeline().fetch_location_kpis().await?)
    }

    /// Asks the pipeline about one order without touching the store.
    pub async fn lookup_order(&self, order_id: &str) -> Result<Order, DashboardError> {
        Ok(self.state.engine.pipeline().fetch_order_status(order_id).await?)
    }

    /// Starts reloading the store every `every`, beginning immediately.
    ///
    /// A failed reload is logged and the previous orders are kept; the next
    /// tick tries again. Replaces a refresher that is already running.
    pub fn spawn_refresher(&mut self, every: Duration) {
        if let Some(previous) = self.refresher.take() {
            previous.abort();
        }

        let state = Arc::clone(&self.state);
        self.refresher = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match state.reload().await {
                    Ok(count) => info!(count, "Periodic reload"),
                    Err(e) => warn!(error = %e, "Periodic reload failed, keeping cached orders"),
                }
            }
        }));
    }

    /// Ends the session: stops the refresher and drops every cached order.
    ///
    /// # Returns
    ///
    /// - `Ok(())` once the refresher is stopped and the store is empty
    /// - `Err(DashboardError::Refresher)` if the refresher had panicked
    pub async fn shutdown(mut self) -> Result<(), DashboardError> {
        info!("Shutting down dashboard...");

        let mut result = Ok(());
        if let Some(handle) = self.refresher.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("Refresher task failed: {:?}", e);
                    result = Err(DashboardError::Refresher(e.to_string()));
                }
            }
        }

        self.state.clear();
        info!("Dashboard shutdown complete.");
        result
    }
}

impl<P: OrderPipeline + 'static> Drop for Dashboard<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.refresher.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockPipeline;
    use crate::clients::TransitionReceipt;
    use crate::domain::{OrderStatus, Role};
    use crate::transition::{TransitionAction, TransitionError};
    use rust_decimal::Decimal;

    fn admin() -> Session {
        Session::new("emp-1", Role::Admin)
    }

    #[test]
    fn test_unauthenticated_session_is_refused() {
        let result = Dashboard::start(Session::anonymous(), Arc::new(MockPipeline::new()));
        assert!(matches!(result, Err(DashboardError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_regular_employee_has_no_analytics() {
        let mock = MockPipeline::new();
        let dashboard =
            Dashboard::start(Session::new("emp-2", Role::Regular), Arc::new(mock.clone())).unwrap();

        assert_eq!(dashboard.analytics(), Err(DashboardError::AdminOnly));
        assert_eq!(dashboard.location_kpis().await, Err(DashboardError::AdminOnly));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_orders() {
        let mock = MockPipeline::new();
        mock.expect_fetch_orders()
            .return_err(PipelineError::Network("offline".into()));
        let dashboard = Dashboard::start(admin(), Arc::new(mock.clone())).unwrap();
        dashboard.replace_all(vec![Order::new("1", OrderStatus::Pendiente, Decimal::ONE)]);

        let result = dashboard.reload().await;
        assert!(matches!(result, Err(DashboardError::Pipeline(PipelineError::Network(_)))));
        assert!(dashboard.get("1").is_some());
        mock.verify();
    }

    #[tokio::test]
    async fn test_transition_refreshes_snapshot() {
        let mock = MockPipeline::new();
        mock.expect_transition(TransitionAction::StartKitchen, "1")
            .return_ok(TransitionReceipt::default());
        let dashboard = Dashboard::start(admin(), Arc::new(mock.clone())).unwrap();
        dashboard.replace_all(vec![Order::new("1", OrderStatus::Pendiente, Decimal::ONE)]);
        assert_eq!(dashboard.analytics().unwrap().count(OrderStatus::Pendiente), 1);

        dashboard.request_transition("1", "en_preparacion").await.unwrap();

        let snapshot = dashboard.analytics().unwrap();
        assert_eq!(snapshot.count(OrderStatus::Pendiente), 0);
        assert_eq!(snapshot.count(OrderStatus::EnPreparacion), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_rejected_transition_surfaces_cause() {
        let mock = MockPipeline::new();
        mock.expect_transition(TransitionAction::CompleteKitchen, "1")
            .return_err(PipelineError::Rejected("El pedido no está listo".into()));
        let dashboard = Dashboard::start(admin(), Arc::new(mock.clone())).unwrap();
        dashboard.replace_all(vec![Order::new("1", OrderStatus::EnPreparacion, Decimal::ONE)]);

        let error = dashboard.request_transition("1", "cocina_completa").await.unwrap_err();
        assert_eq!(
            error,
            DashboardError::Transition(TransitionError::RemoteRejected {
                order_id: "1".into(),
                reason: "El pedido no está listo".into(),
            })
        );
        assert_eq!(error.to_string(), "Transition rejected for order 1: El pedido no está listo");
        assert_eq!(dashboard.get("1").unwrap().status, OrderStatus::EnPreparacion);
        mock.verify();
    }

    #[tokio::test]
    async fn test_reload_with_overflowing_totals_keeps_working() {
        let huge = Decimal::MAX;
        let mock = MockPipeline::new();
        mock.expect_fetch_orders().return_ok(vec![
            Order::new("1", OrderStatus::Entregado, huge),
            Order::new("2", OrderStatus::Entregado, huge),
        ]);
        mock.expect_fetch_orders()
            .return_ok(vec![Order::new("3", OrderStatus::Entregado, Decimal::TEN)]);
        let dashboard = Dashboard::start(admin(), Arc::new(mock.clone())).unwrap();

        assert_eq!(dashboard.reload().await.unwrap(), 2);
        assert_eq!(dashboard.analytics().unwrap().delivered_revenue, Decimal::MAX);

        assert_eq!(dashboard.reload().await.unwrap(), 1);
        assert_eq!(dashboard.analytics().unwrap().delivered_revenue, Decimal::TEN);
        mock.verify();
    }

    #[tokio::test]
    async fn test_shutdown_clears_the_store() {
        let dashboard = Dashboard::start(admin(), Arc::new(MockPipeline::new())).unwrap();
        dashboard.replace_all(vec![Order::new("1", OrderStatus::Pendiente, Decimal::ONE)]);
        let state = Arc::clone(&dashboard.state);

        dashboard.shutdown().await.unwrap();

        assert!(read_store(&state.store).is_empty());
        assert!(state.snapshot.read().unwrap().is_none());
    }
}
