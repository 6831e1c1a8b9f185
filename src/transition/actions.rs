//! The five remote actions that move an order forward.
//!
//! Each pipeline stage is its own remote action with its own route, so the
//! engine dispatches on [`TransitionAction`] instead of sending a generic
//! "set status" request.

use crate::domain::OrderStatus;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionAction {
    /// Kitchen picks the order up (`en_preparacion`).
    StartKitchen,
    /// Kitchen finished cooking (`cocina_completa`).
    CompleteKitchen,
    /// Order is packed (`empaquetado`).
    CompletePackaging,
    /// Rider leaves with the order (`pedido_en_camino`).
    StartDelivery,
    /// Rider handed the order over (`entregado`).
    ConfirmDelivery,
}

impl TransitionAction {
    pub const ALL: [TransitionAction; 5] = [
        TransitionAction::StartKitchen,
        TransitionAction::CompleteKitchen,
        TransitionAction::CompletePackaging,
        TransitionAction::StartDelivery,
        TransitionAction::ConfirmDelivery,
    ];

    /// Resolves a target value picked by the employee. Anything but the five
    /// exposed values is `None`.
    pub fn from_target(target: &str) -> Option<Self> {
        match target.trim() {
            "en_preparacion" => Some(TransitionAction::StartKitchen),
            "cocina_completa" => Some(TransitionAction::CompleteKitchen),
            "empaquetado" => Some(TransitionAction::CompletePackaging),
            "pedido_en_camino" => Some(TransitionAction::StartDelivery),
            "entregado" => Some(TransitionAction::ConfirmDelivery),
            _ => None,
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            TransitionAction::StartKitchen => "en_preparacion",
            TransitionAction::CompleteKitchen => "cocina_completa",
            TransitionAction::CompletePackaging => "empaquetado",
            TransitionAction::StartDelivery => "pedido_en_camino",
            TransitionAction::ConfirmDelivery => "entregado",
        }
    }

    /// The state an order is in once the pipeline accepted this action.
    pub fn resulting_status(&self) -> OrderStatus {
        match self {
            TransitionAction::StartKitchen => OrderStatus::EnPreparacion,
            TransitionAction::CompleteKitchen => OrderStatus::EnCocina,
            TransitionAction::CompletePackaging => OrderStatus::Empaquetado,
            TransitionAction::StartDelivery => OrderStatus::EnDelivery,
            TransitionAction::ConfirmDelivery => OrderStatus::Entregado,
        }
    }

    /// The state the workflow expects the order to be in beforehand.
    ///
    /// Only pipeline implementations consult this; the engine leaves the
    /// decision to the remote side.
    pub fn required_status(&self) -> OrderStatus {
        match self {
            TransitionAction::StartKitchen => OrderStatus::Pendiente,
            TransitionAction::CompleteKitchen => OrderStatus::EnPreparacion,
            TransitionAction::CompletePackaging => OrderStatus::EnCocina,
            TransitionAction::StartDelivery => OrderStatus::Empaquetado,
            TransitionAction::ConfirmDelivery => OrderStatus::EnDelivery,
        }
    }

    /// Path of the employee service endpoint for this stage.
    pub fn route(&self) -> &'static str {
        match self {
            TransitionAction::StartKitchen => "/empleados/cocina/iniciar",
            TransitionAction::CompleteKitchen => "/empleados/cocina/completar",
            TransitionAction::CompletePackaging => "/empleados/empaque/completar",
            TransitionAction::StartDelivery => "/empleados/delivery/iniciar",
            TransitionAction::ConfirmDelivery => "/empleados/delivery/entregar",
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

impl FromStr for TransitionAction {
    type Err = super::TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransitionAction::from_target(s)
            .ok_or_else(|| super::TransitionError::InvalidTargetStatus(s.to_string()))
    }
}
