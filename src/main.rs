//! # Kitchen Dashboard demo
//!
//! Opens an admin dashboard and walks one order through every stage.
//!
//! - Without configuration it runs against an [`InMemoryPipeline`] seeded with a
//!   few orders.
//! - With `DASHBOARD_CONFIG=<file.toml>` it talks to the real services through
//!   [`HttpPipeline`].

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use kitchen_dashboard::clients::{HttpPipeline, InMemoryPipeline, OrderPipeline};
use kitchen_dashboard::config::DashboardConfig;
use kitchen_dashboard::domain::{Order, OrderStatus, Role, Session};
use kitchen_dashboard::runtime::{setup_tracing, Dashboard};
use kitchen_dashboard::transition::TransitionAction;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config_path = std::env::var_os("DASHBOARD_CONFIG").map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref()).context("loading configuration")?;
    let session = Session::new("EMP-001", Role::Admin);

    info!(local_id = %config.local_id, "Starting kitchen dashboard");

    if config_path.is_some() {
        let pipeline = HttpPipeline::new(config.clone()).context("building HTTP pipeline")?;
        run(session, Arc::new(pipeline), &config).await
    } else {
        let pipeline = InMemoryPipeline::new(config.local_id.clone(), seed_orders());
        run(session, Arc::new(pipeline), &config).await
    }
}

async fn run<P: OrderPipeline + 'static>(
    session: Session,
    pipeline: Arc<P>,
    config: &DashboardConfig,
) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::start(session, pipeline)?;

    let count = dashboard
        .reload()
        .instrument(tracing::info_span!("initial_load"))
        .await?;
    info!(count, "Orders loaded");
    dashboard.spawn_refresher(config.poll_interval());

    for order in dashboard.view() {
        info!(order_id = %order.order_id, status = %order.status, total = %order.total(), "Order");
    }

    // Walk the oldest pending order through every stage
    let pending = dashboard
        .view()
        .into_iter()
        .rev()
        .find(|o| o.status == OrderStatus::Pendiente);

    if let Some(order) = pending {
        let span = tracing::info_span!("order_processing", order_id = %order.order_id);
        async {
            for action in TransitionAction::ALL {
                match dashboard.request_transition(&order.order_id, action.target()).await {
                    Ok(updated) => info!(status = %updated.status, "Stage confirmed"),
                    Err(e) => {
                        error!(error = %e, "Stage failed");
                        break;
                    }
                }
            }
        }
        .instrument(span)
        .await;
    } else {
        info!("No pending orders to process");
    }

    let snapshot = dashboard.analytics()?;
    info!(
        total = snapshot.total,
        delivered = snapshot.delivered(),
        in_progress = snapshot.in_progress(),
        revenue = %snapshot.delivered_revenue,
        completion = %format!("{:.1}%", snapshot.completion_percent()),
        cancellation = %format!("{:.1}%", snapshot.cancellation_percent()),
        "Analytics snapshot"
    );

    match dashboard.location_kpis().await {
        Ok(kpis) => info!(
            local_id = %kpis.local_id,
            total_orders = kpis.total_orders,
            revenue = %kpis.revenue_total,
            "Location KPIs"
        ),
        Err(e) => error!(error = %e, "Location KPIs unavailable"),
    }

    // Shutdown gracefully
    dashboard.shutdown().await?;

    info!("Dashboard demo completed successfully");
    Ok(())
}

fn seed_orders() -> Vec<Order> {
    let now = Utc::now();
    vec![
        Order::new("P-1001", OrderStatus::Pendiente, Decimal::new(4590, 2))
            .with_customer("Ana")
            .with_item("Ceviche", 1)
            .with_item("Chicha morada", 2)
            .with_created_at(now - ChronoDuration::minutes(25)),
        Order::new("P-1002", OrderStatus::EnCocina, Decimal::new(3200, 2))
            .with_customer("Luis")
            .with_item("Lomo saltado", 1)
            .with_created_at(now - ChronoDuration::minutes(15)),
        Order::new("P-1003", OrderStatus::Entregado, Decimal::new(2750, 2))
            .with_customer("Rosa")
            .with_item("Aji de gallina", 1)
            .with_created_at(now - ChronoDuration::minutes(90)),
        Order::new("P-1004", OrderStatus::Cancelado, Decimal::new(1800, 2))
            .with_customer("Jorge")
            .with_created_at(now - ChronoDuration::minutes(60)),
    ]
}
