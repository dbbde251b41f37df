use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{Cargo, ConsignmentStatus, Forwarding, PaymentMethod};

// ============================================================================
// Consignment Commands - Represent user intent
// ============================================================================

/// Everything needed to open a new consignment stream. References are
/// already resolved and ownership already taken from the session. The
/// number is issued separately, once the registration has been checked.
#[derive(Debug, Clone)]
pub struct RegisterConsignment {
    pub consignment_id: Uuid,
    pub origin_branch_id: Uuid,
    pub destination_branch_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub cargo: Cargo,
    pub rate_per_kg: Decimal,
    pub price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub forwarding: Forwarding,
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,
}

/// Raw patch; pricing is resolved by the aggregate against current state
#[derive(Debug, Clone, Default)]
pub struct ConsignmentPatch {
    pub origin_branch_id: Option<Uuid>,
    pub destination_branch_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub commodity: Option<String>,
    pub packing: Option<String>,
    pub pieces: Option<u32>,
    pub weight_kg: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
    pub price: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub forwarding: Option<Forwarding>,
}

#[derive(Debug, Clone)]
pub enum ConsignmentCommand {
    Update {
        patch: ConsignmentPatch,
    },
    ChangeStatus {
        status: ConsignmentStatus,
    },
    AssignTruck {
        truck_id: Uuid,
    },
}

impl ConsignmentCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ConsignmentCommand::Update { .. } => "update_consignment",
            ConsignmentCommand::ChangeStatus { .. } => "update_consignment_status",
            ConsignmentCommand::AssignTruck { .. } => "assign_truck",
        }
    }
}
