use super::{OrderPipeline, PipelineError, TransitionReceipt};
use crate::analytics::LocationKpis;
use crate::config::DashboardConfig;
use crate::domain::order::parse_decimal;
use crate::domain::Order;
use crate::transition::TransitionAction;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Body of every stage endpoint.
#[derive(Debug, Serialize)]
struct TransitionRequest<'a> {
    order_id: &'a str,
    empleado_id: &'a str,
}

/// [`OrderPipeline`] over the backend's HTTP services.
///
/// Non-2xx answers become [`PipelineError::Rejected`] carrying the body's
/// `message` (or `error`) text, except `404` ([`PipelineError::NotFound`])
/// and `5xx` ([`PipelineError::Network`]). Connection failures and timeouts
/// are [`PipelineError::Network`].
#[derive(Clone)]
pub struct HttpPipeline {
    http: Client,
    config: DashboardConfig,
}

impl HttpPipeline {
    pub fn new(config: DashboardConfig) -> Result<Self, PipelineError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, PipelineError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            return Err(status_error(status, &body, "Error al consultar el servicio"));
        }
        Ok(body)
    }
}

#[async_trait]
impl OrderPipeline for HttpPipeline {
    #[instrument(skip(self))]
    async fn submit_transition(
        &self,
        action: TransitionAction,
        order_id: &str,
        actor_id: &str,
    ) -> Result<TransitionReceipt, PipelineError> {
        let url = format!("{}{}", self.config.employees_url, action.route());
        debug!(%url, "Posting transition");

        let response = self
            .http
            .post(&url)
            .json(&TransitionRequest {
                order_id,
                empleado_id: actor_id,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            return Err(status_error(status, &body, "Error al actualizar el estado"));
        }

        Ok(TransitionReceipt {
            message: body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_orders(&self) -> Result<Vec<Order>, PipelineError> {
        let url = format!("{}{}", self.config.customers_url, self.config.orders_path);
        let body = self
            .get_json(&url, &[("local_id", self.config.local_id.as_str())])
            .await?;

        let records = match &body {
            Value::Array(records) => records.as_slice(),
            Value::Object(object) => ["pedidos", "orders", "data", "items"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_array))
                .map(Vec::as_slice)
                .ok_or_else(|| PipelineError::Decode("order list has no array field".into()))?,
            _ => return Err(PipelineError::Decode("order list is not JSON".into())),
        };

        let orders = Order::decode_all(records);
        debug!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn fetch_order_status(&self, order_id: &str) -> Result<Order, PipelineError> {
        let url = format!("{}/pedido/status", self.config.customers_url);
        let body = self
            .get_json(
                &url,
                &[
                    ("local_id", self.config.local_id.as_str()),
                    ("pedido_id", order_id),
                ],
            )
            .await
            .map_err(|e| match e {
                PipelineError::NotFound(_) => PipelineError::NotFound(order_id.to_string()),
                other => other,
            })?;

        Order::from_value(&body).map_err(|e| PipelineError::Decode(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn fetch_location_kpis(&self) -> Result<LocationKpis, PipelineError> {
        let local_id = self.config.local_id.as_str();
        let orders_url = format!("{}/analytics/pedidos-por-local", self.config.analytics_url);
        let revenue_url = format!("{}/analytics/ganancias-por-local", self.config.analytics_url);

        let query = [("local_id", local_id)];
        let (orders, revenue) = tokio::join!(
            self.get_json(&orders_url, &query),
            self.get_json(&revenue_url, &query),
        );
        let orders = first_row(&orders?);
        let revenue = first_row(&revenue?);

        Ok(LocationKpis {
            local_id: local_id.to_string(),
            total_orders: count_field(&orders, "total_pedidos"),
            delivered_orders: count_field(&revenue, "total_pedidos"),
            revenue_total: decimal_field(&revenue, "ganancias_totales"),
            revenue_average: decimal_field(&revenue, "ganancia_promedio"),
        })
    }
}

fn transport_error(error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
        PipelineError::Network("request timed out".into())
    } else {
        PipelineError::Network(error.to_string())
    }
}

/// Reads the body as JSON, treating an empty or non-JSON body as `null`.
async fn read_body(response: Response) -> Result<(StatusCode, Value), PipelineError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or_else(|_| {
            warn!(%status, "Response body is not JSON");
            Value::String(text)
        })
    };
    Ok((status, body))
}

fn status_error(status: StatusCode, body: &Value, fallback: &str) -> PipelineError {
    let message = ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{fallback} ({status})"));

    if status == StatusCode::NOT_FOUND {
        PipelineError::NotFound(message)
    } else if status.is_server_error() {
        PipelineError::Network(message)
    } else {
        PipelineError::Rejected(message)
    }
}

/// Analytics queries answer `{ "data": [row, ...] }`; only the first row matters.
fn first_row(body: &Value) -> Value {
    body.get("data")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .cloned()
        .unwrap_or(Value::Null)
}

fn count_field(row: &Value, key: &str) -> u64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn decimal_field(row: &Value, key: &str) -> Decimal {
    row.get(key).and_then(parse_decimal).unwrap_or(Decimal::ZERO)
}
