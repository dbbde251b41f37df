use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::DomainEvent;
use super::value_objects::PickupStatus;

// ============================================================================
// Pickup Events - Domain Events for the Pickup Request Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PickupEvent {
    Requested(PickupRequested),
    Updated(PickupUpdated),
    StatusChanged(PickupStatusChanged),
    Deleted(PickupDeleted),
}

impl DomainEvent for PickupEvent {
    fn event_type() -> &'static str { "PickupEvent" }

    fn variant_name(&self) -> &'static str {
        match self {
            PickupEvent::Requested(_) => "PickupRequested",
            PickupEvent::Updated(_) => "PickupUpdated",
            PickupEvent::StatusChanged(_) => "PickupStatusChanged",
            PickupEvent::Deleted(_) => "PickupDeleted",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PickupRequested {
    pub pickup_id: Uuid,
    pub sender_id: Uuid,
    pub pickup_address: String,
    pub destination: String,
    pub pieces: u32,
    pub requested_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PickupChanges {
    pub sender_id: Option<Uuid>,
    pub pickup_address: Option<String>,
    pub destination: Option<String>,
    pub pieces: Option<u32>,
    pub requested_at: Option<DateTime<Utc>>,
}

impl PickupChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PickupUpdated {
    pub changes: PickupChanges,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PickupStatusChanged {
    pub from: PickupStatus,
    pub to: PickupStatus,
    pub changed_at: DateTime<Utc>,
}

/// Terminal; the stream stays for audit, the request leaves every view
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PickupDeleted {
    pub deleted_at: DateTime<Utc>,
}
