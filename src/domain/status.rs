//! The seven fulfillment pipeline states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an order sits in the fulfillment pipeline.
///
/// Variants are declared in pipeline order, with `Cancelado` last. The wire
/// names are the lowercase Spanish identifiers the backend uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pendiente,
    EnPreparacion,
    EnCocina,
    Empaquetado,
    EnDelivery,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    /// Every state, in pipeline order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pendiente,
        OrderStatus::EnPreparacion,
        OrderStatus::EnCocina,
        OrderStatus::Empaquetado,
        OrderStatus::EnDelivery,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    /// Wire identifier, e.g. `en_preparacion`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::EnPreparacion => "en_preparacion",
            OrderStatus::EnCocina => "en_cocina",
            OrderStatus::Empaquetado => "empaquetado",
            OrderStatus::EnDelivery => "en_delivery",
            OrderStatus::Entregado => "entregado",
            OrderStatus::Cancelado => "cancelado",
        }
    }

    /// Human readable label shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "Pendiente",
            OrderStatus::EnPreparacion => "En Preparación",
            OrderStatus::EnCocina => "En Cocina",
            OrderStatus::Empaquetado => "Empaquetado",
            OrderStatus::EnDelivery => "En Delivery",
            OrderStatus::Entregado => "Entregado",
            OrderStatus::Cancelado => "Cancelado",
        }
    }

    /// `Entregado` and `Cancelado` accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Entregado | OrderStatus::Cancelado)
    }

    /// Resolves a status string the way the backend emits it.
    ///
    /// Besides the canonical identifiers this accepts the intermediate names
    /// produced by the workflow handlers (`procesando`, `cocina_completa`,
    /// `pedido_en_camino`, ...) and ignores case, so `COCINA_COMPLETA` maps to
    /// [`OrderStatus::EnCocina`]. Returns `None` for anything else.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let status = match normalized.as_str() {
            "pendiente" | "procesando" => OrderStatus::Pendiente,
            "en_preparacion" => OrderStatus::EnPreparacion,
            "en_cocina" | "pedido_en_cocina" | "cocina_completa" => OrderStatus::EnCocina,
            "empaquetado" => OrderStatus::Empaquetado,
            "en_delivery" | "pedido_en_camino" => OrderStatus::EnDelivery,
            "entregado" => OrderStatus::Entregado,
            "cancelado" => OrderStatus::Cancelado,
            _ => return None,
        };
        Some(status)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no pipeline state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::from_wire(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
