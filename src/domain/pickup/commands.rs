use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::events::PickupChanges;
use super::value_objects::PickupStatus;

// ============================================================================
// Pickup Commands
// ============================================================================

/// Opening command; ownership already taken from the session
#[derive(Debug, Clone)]
pub struct RequestPickup {
    pub pickup_id: Uuid,
    pub sender_id: Uuid,
    pub pickup_address: String,
    pub destination: String,
    pub pieces: u32,
    pub requested_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,
}

#[derive(Debug, Clone)]
pub enum PickupCommand {
    Update { changes: PickupChanges },
    ChangeStatus { status: PickupStatus },
    Delete,
}

impl PickupCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PickupCommand::Update { .. } => "update",
            PickupCommand::ChangeStatus { .. } => "update_status",
            PickupCommand::Delete => "delete",
        }
    }
}
