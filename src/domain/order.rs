//! The [`Order`] record and its lenient decoding from backend payloads.

use super::OrderStatus;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// A single customer purchase tracked through the fulfillment pipeline.
///
/// `status` is always one of the seven pipeline states and `total` is never
/// negative; both are guaranteed by [`Order::from_value`], which defaults
/// malformed input instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Order {
    pub order_id: String,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    /// Never negative; read it through [`Order::total`].
    total: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

/// Failure to decode a record that cannot be treated as an order at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderDecodeError {
    #[error("Order payload is not a JSON object")]
    NotAnObject,

    #[error("Order payload has no identity field")]
    MissingIdentity,
}

const ID_FIELDS: &[&str] = &["order_id", "pedido_id", "id"];
const STATUS_FIELDS: &[&str] = &["status", "estado"];
const CUSTOMER_FIELDS: &[&str] = &[
    "customer_name",
    "cliente_nombre",
    "usuario_nombre",
    "usuario_email",
    "cliente",
];
const ITEM_FIELDS: &[&str] = &["items", "productos"];
const ITEM_NAME_FIELDS: &[&str] = &["name", "nombre", "producto_nombre"];
const ITEM_QUANTITY_FIELDS: &[&str] = &["quantity", "cantidad"];
const CREATED_AT_FIELDS: &[&str] = &["created_at", "fecha_creacion", "createdAt"];

impl Order {
    /// Creates an order with no customer, items or timestamp.
    ///
    /// # Arguments
    /// * `order_id` - Identity of the order within a store
    /// * `status` - Current pipeline state
    /// * `total` - Order amount; negative values are clamped to zero
    pub fn new(order_id: impl Into<String>, status: OrderStatus, total: Decimal) -> Self {
        Self {
            order_id: order_id.into(),
            status,
            customer_name: None,
            total: total.max(Decimal::ZERO),
            items: Vec::new(),
            created_at: None,
        }
    }

    /// Order amount, never negative.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_item(mut self, name: impl Into<String>, quantity: u32) -> Self {
        if quantity > 0 {
            self.items.push(OrderItem {
                name: name.into(),
                quantity,
            });
        }
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Decodes one order from an untyped backend record.
    ///
    /// Field names follow the backend services (`pedido_id`, `estado`,
    /// `fecha_creacion`, ...). Only a missing identity is an error; every
    /// other field degrades to a default:
    /// - missing or unknown `status` becomes [`OrderStatus::Pendiente`]
    /// - missing, malformed or negative `total` becomes zero
    /// - items without a positive quantity are dropped
    /// - unparseable timestamps become `None`
    pub fn from_value(value: &Value) -> Result<Self, OrderDecodeError> {
        let object = value.as_object().ok_or(OrderDecodeError::NotAnObject)?;

        let order_id = first_field(object, ID_FIELDS)
            .and_then(scalar_to_string)
            .filter(|id| !id.is_empty())
            .ok_or(OrderDecodeError::MissingIdentity)?;

        let status = match first_field(object, STATUS_FIELDS).and_then(Value::as_str) {
            Some(raw) => OrderStatus::from_wire(raw).unwrap_or_else(|| {
                warn!(order_id = %order_id, status = raw, "Unknown status, treating as pendiente");
                OrderStatus::Pendiente
            }),
            None => OrderStatus::Pendiente,
        };

        let items = first_field(object, ITEM_FIELDS)
            .and_then(Value::as_array)
            .map(|raw| raw.iter().filter_map(decode_item).collect())
            .unwrap_or_default();

        Ok(Self {
            order_id,
            status,
            customer_name: first_field(object, CUSTOMER_FIELDS).and_then(scalar_to_string),
            total: object.get("total").map(parse_total).unwrap_or(Decimal::ZERO),
            items,
            created_at: first_field(object, CREATED_AT_FIELDS).and_then(parse_timestamp),
        })
    }

    /// Decodes a batch, skipping records that have no identity.
    pub fn decode_all(values: &[Value]) -> Vec<Order> {
        values
            .iter()
            .filter_map(|value| match Order::from_value(value) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable order record");
                    None
                }
            })
            .collect()
    }
}

impl TryFrom<Value> for Order {
    type Error = OrderDecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Order::from_value(&value)
    }
}

fn first_field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| object.get(*name))
        .find(|value| !value.is_null())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a decimal from a JSON number or numeric string.
pub(crate) fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim())
            .ok()
            .or_else(|| Decimal::from_scientific(s.trim()).ok()),
        _ => None,
    }
}

fn parse_total(value: &Value) -> Decimal {
    parse_decimal(value)
        .filter(|total| !total.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

fn decode_item(value: &Value) -> Option<OrderItem> {
    let object = value.as_object()?;
    let quantity = match first_field(object, ITEM_QUANTITY_FIELDS)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    let quantity = u32::try_from(quantity).ok().filter(|q| *q > 0)?;
    let name = first_field(object, ITEM_NAME_FIELDS)
        .and_then(scalar_to_string)
        .unwrap_or_default();
    Some(OrderItem { name, quantity })
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                // The workflow handlers write naive UTC timestamps.
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_backend_field_names() {
        let order = Order::from_value(&json!({
            "pedido_id": "P-1",
            "estado": "en_cocina",
            "cliente_nombre": "Ana",
            "total": "45.50",
            "productos": [
                {"nombre": "Ceviche", "cantidad": 2},
                {"producto_nombre": "Chicha", "cantidad": "1"}
            ],
            "fecha_creacion": "2025-03-01T12:30:00.123456"
        }))
        .unwrap();

        assert_eq!(order.order_id, "P-1");
        assert_eq!(order.status, OrderStatus::EnCocina);
        assert_eq!(order.customer_name.as_deref(), Some("Ana"));
        assert_eq!(order.total(), Decimal::new(4550, 2));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].name, "Chicha");
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_malformed_fields_fall_back_to_defaults() {
        let order = Order::from_value(&json!({
            "id": 17,
            "estado": "perdido",
            "total": "abc",
            "items": [{"name": "Agua", "quantity": 0}, {"name": "Pan"}],
            "created_at": "yesterday"
        }))
        .unwrap();

        assert_eq!(order.order_id, "17");
        assert_eq!(order.status, OrderStatus::Pendiente);
        assert_eq!(order.total(), Decimal::ZERO);
        assert!(order.items.is_empty());
        assert_eq!(order.created_at, None);
    }

    #[test]
    fn test_constructor_clamps_negative_total() {
        let order = Order::new("x", OrderStatus::Pendiente, Decimal::new(-250, 2));
        assert_eq!(order.total(), Decimal::ZERO);
        assert_eq!(Order::new("y", OrderStatus::Pendiente, Decimal::TEN).total(), Decimal::TEN);
    }

    #[test]
    fn test_negative_total_is_clamped() {
        let order = Order::from_value(&json!({"order_id": "x", "total": -3.5})).unwrap();
        assert_eq!(order.total(), Decimal::ZERO);
    }

    #[test]
    fn test_record_without_identity_is_rejected() {
        assert_eq!(
            Order::from_value(&json!({"estado": "pendiente"})),
            Err(OrderDecodeError::MissingIdentity)
        );
        assert_eq!(Order::from_value(&json!([1, 2])), Err(OrderDecodeError::NotAnObject));
    }

    #[test]
    fn test_decode_all_skips_bad_records() {
        let orders = Order::decode_all(&[
            json!({"pedido_id": "a"}),
            json!({"total": 5}),
            json!({"pedido_id": "b", "estado": "entregado"}),
        ]);
        let ids: Vec<_> = orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_serialized_order_decodes_back() {
        let original = Order::new("9", OrderStatus::Empaquetado, Decimal::new(1999, 2))
            .with_customer("Luis")
            .with_item("Lomo", 1);
        let json = serde_json::to_value(&original).unwrap();
        let decoded: Order = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, original);
    }
}
