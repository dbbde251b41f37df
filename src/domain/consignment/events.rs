use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::DomainEvent;
use super::value_objects::{
    Cargo, ConsignmentNumber, ConsignmentStatus, Forwarding, PaymentMethod, Pricing,
};

// ============================================================================
// Consignment Events - Domain Events for the Consignment Note Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConsignmentEvent {
    Created(ConsignmentCreated),
    Updated(ConsignmentUpdated),
    StatusChanged(ConsignmentStatusChanged),
    TruckAssigned(ConsignmentTruckAssigned),
}

impl DomainEvent for ConsignmentEvent {
    fn event_type() -> &'static str { "ConsignmentEvent" }

    fn variant_name(&self) -> &'static str {
        match self {
            ConsignmentEvent::Created(_) => "ConsignmentCreated",
            ConsignmentEvent::Updated(_) => "ConsignmentUpdated",
            ConsignmentEvent::StatusChanged(_) => "ConsignmentStatusChanged",
            ConsignmentEvent::TruckAssigned(_) => "ConsignmentTruckAssigned",
        }
    }
}

/// Consignment Created - number issued, references resolved, price settled
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConsignmentCreated {
    pub consignment_id: Uuid,
    pub number: ConsignmentNumber,
    pub barcode: String,
    pub origin_branch_id: Uuid,
    pub destination_branch_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub cargo: Cargo,
    pub pricing: Pricing,
    pub payment_method: PaymentMethod,
    pub forwarding: Forwarding,
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Field-level changes after validation; `None` leaves the field untouched
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConsignmentChanges {
    pub origin_branch_id: Option<Uuid>,
    pub destination_branch_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub commodity: Option<String>,
    pub packing: Option<String>,
    pub pieces: Option<u32>,
    pub weight_kg: Option<rust_decimal::Decimal>,
    pub pricing: Option<Pricing>,
    pub payment_method: Option<PaymentMethod>,
    pub forwarding: Option<Forwarding>,
}

impl ConsignmentChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConsignmentUpdated {
    pub changes: ConsignmentChanges,
    pub updated_at: DateTime<Utc>,
}

/// Status moved; `from` is kept for the audit trail
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConsignmentStatusChanged {
    pub from: ConsignmentStatus,
    pub to: ConsignmentStatus,
    pub changed_at: DateTime<Utc>,
}

/// Put on a truck (or moved to another one); status becomes MUAT
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConsignmentTruckAssigned {
    pub truck_id: Uuid,
    pub previous_truck_id: Option<Uuid>,
    pub from: ConsignmentStatus,
    pub assigned_at: DateTime<Utc>,
}
