use serde::Serialize;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::Aggregate;
use super::value_objects::PickupStatus;
use super::events::*;
use super::commands::{PickupCommand, RequestPickup};
use super::errors::PickupError;

// ============================================================================
// Pickup Request Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PickupRequest {
    pub id: Uuid,
    pub version: i64,
    pub sender_id: Uuid,
    pub pickup_address: String,
    pub destination: String,
    pub pieces: u32,
    pub requested_at: DateTime<Utc>,
    pub status: PickupStatus,
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted: bool,
}

impl PickupRequest {
    pub fn register(command: &RequestPickup) -> Result<PickupEvent, PickupError> {
        Self::validate_fields(command.pieces, &command.pickup_address, &command.destination)?;

        Ok(PickupEvent::Requested(PickupRequested {
            pickup_id: command.pickup_id,
            sender_id: command.sender_id,
            pickup_address: command.pickup_address.trim().to_string(),
            destination: command.destination.trim().to_string(),
            pieces: command.pieces,
            requested_at: command.requested_at,
            created_by: command.created_by,
            owning_branch_id: command.owning_branch_id,
            created_at: Utc::now(),
        }))
    }

    fn validate_fields(pieces: u32, address: &str, destination: &str) -> Result<(), PickupError> {
        if pieces < 1 {
            return Err(PickupError::InvalidPieces);
        }
        if address.trim().is_empty() {
            return Err(PickupError::EmptyAddress);
        }
        if destination.trim().is_empty() {
            return Err(PickupError::EmptyDestination);
        }
        Ok(())
    }

    /// Deleted and finished requests accept no further edits
    pub fn ensure_open(&self) -> Result<(), PickupError> {
        if self.deleted {
            return Err(PickupError::Deleted);
        }
        if self.status.is_locked() {
            return Err(PickupError::Locked);
        }
        Ok(())
    }
}

impl Aggregate for PickupRequest {
    type Event = PickupEvent;
    type Command = PickupCommand;
    type Error = PickupError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            PickupEvent::Requested(e) => Ok(Self {
                id: e.pickup_id,
                version: 0,
                sender_id: e.sender_id,
                pickup_address: e.pickup_address.clone(),
                destination: e.destination.clone(),
                pieces: e.pieces,
                requested_at: e.requested_at,
                status: PickupStatus::Pending,
                created_by: e.created_by,
                owning_branch_id: e.owning_branch_id,
                created_at: e.created_at,
                updated_at: e.created_at,
                deleted: false,
            }),
            _ => Err(PickupError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            PickupEvent::Requested(_) => {}
            PickupEvent::Updated(e) => {
                let c = &e.changes;
                if let Some(id) = c.sender_id {
                    self.sender_id = id;
                }
                if let Some(ref address) = c.pickup_address {
                    self.pickup_address = address.clone();
                }
                if let Some(ref destination) = c.destination {
                    self.destination = destination.clone();
                }
                if let Some(pieces) = c.pieces {
                    self.pieces = pieces;
                }
                if let Some(at) = c.requested_at {
                    self.requested_at = at;
                }
                self.updated_at = e.updated_at;
            }
            PickupEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.changed_at;
            }
            PickupEvent::Deleted(e) => {
                self.deleted = true;
                self.updated_at = e.deleted_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_open()?;

        match command {
            PickupCommand::Update { changes } => {
                Self::validate_fields(
                    changes.pieces.unwrap_or(self.pieces),
                    changes.pickup_address.as_deref().unwrap_or(&self.pickup_address),
                    changes.destination.as_deref().unwrap_or(&self.destination),
                )?;
                if changes.is_empty() {
                    return Ok(vec![]);
                }

                let mut changes = changes.clone();
                changes.pickup_address = changes.pickup_address.map(|a| a.trim().to_string());
                changes.destination = changes.destination.map(|d| d.trim().to_string());

                Ok(vec![PickupEvent::Updated(PickupUpdated {
                    changes,
                    updated_at: Utc::now(),
                })])
            }
            PickupCommand::ChangeStatus { status } => {
                if *status == self.status {
                    return Ok(vec![]);
                }
                Ok(vec![PickupEvent::StatusChanged(PickupStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_at: Utc::now(),
                })])
            }
            PickupCommand::Delete => Ok(vec![PickupEvent::Deleted(PickupDeleted {
                deleted_at: Utc::now(),
            })]),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RequestPickup {
        RequestPickup {
            pickup_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            pickup_address: " Jl. Gatot Subroto 12 ".to_string(),
            destination: "Surabaya".to_string(),
            pieces: 4,
            requested_at: Utc::now(),
            created_by: Uuid::new_v4(),
            owning_branch_id: Uuid::new_v4(),
        }
    }

    fn opened() -> PickupRequest {
        let event = PickupRequest::register(&request()).unwrap();
        PickupRequest::apply_first_event(&event).unwrap()
    }

    fn finished() -> PickupRequest {
        let mut pickup = opened();
        let events = pickup
            .handle_command(&PickupCommand::ChangeStatus { status: PickupStatus::Finish })
            .unwrap();
        pickup.apply_event(&events[0]).unwrap();
        pickup
    }

    #[test]
    fn test_new_request_is_pending_and_trimmed() {
        let pickup = opened();
        assert_eq!(pickup.status, PickupStatus::Pending);
        assert_eq!(pickup.pickup_address, "Jl. Gatot Subroto 12");
    }

    #[test]
    fn test_register_rejects_zero_pieces() {
        let mut command = request();
        command.pieces = 0;
        assert!(matches!(PickupRequest::register(&command), Err(PickupError::InvalidPieces)));
    }

    #[test]
    fn test_finished_request_is_locked() {
        let pickup = finished();

        let update = PickupCommand::Update {
            changes: PickupChanges { pieces: Some(9), ..Default::default() },
        };
        assert!(matches!(pickup.handle_command(&update), Err(PickupError::Locked)));
        assert!(matches!(pickup.handle_command(&PickupCommand::Delete), Err(PickupError::Locked)));
        assert!(matches!(
            pickup.handle_command(&PickupCommand::ChangeStatus { status: PickupStatus::Pending }),
            Err(PickupError::Locked)
        ));
        assert_eq!(pickup.pieces, 4);
    }

    #[test]
    fn test_update_applies_changes() {
        let mut pickup = opened();
        let update = PickupCommand::Update {
            changes: PickupChanges {
                pieces: Some(6),
                destination: Some(" Medan ".to_string()),
                ..Default::default()
            },
        };

        let events = pickup.handle_command(&update).unwrap();
        pickup.apply_event(&events[0]).unwrap();
        assert_eq!(pickup.pieces, 6);
        assert_eq!(pickup.destination, "Medan");
    }

    #[test]
    fn test_deleted_request_rejects_commands() {
        let mut pickup = opened();
        let events = pickup.handle_command(&PickupCommand::Delete).unwrap();
        pickup.apply_event(&events[0]).unwrap();

        assert!(pickup.deleted);
        assert!(matches!(pickup.handle_command(&PickupCommand::Delete), Err(PickupError::Deleted)));
    }
}
