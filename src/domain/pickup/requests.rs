use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{validate_input, DomainError, FieldErrors};
use super::events::PickupChanges;
use super::value_objects::PickupStatus;

// ============================================================================
// Pickup Input DTOs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePickupRequest {
    #[validate(required(message = "is required"))]
    pub sender_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub pickup_address: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub destination: String,
    #[validate(required(message = "is required"), range(min = 1, message = "must be at least 1"))]
    pub pieces: Option<u32>,
    /// Defaults to now
    pub requested_at: Option<DateTime<Utc>>,
}

/// Validated create input
#[derive(Debug, Clone)]
pub struct PickupDraft {
    pub sender_id: Uuid,
    pub pickup_address: String,
    pub destination: String,
    pub pieces: u32,
    pub requested_at: DateTime<Utc>,
}

impl CreatePickupRequest {
    pub fn into_draft(self) -> Result<PickupDraft, DomainError> {
        validate_input(&self, FieldErrors::new())?;

        Ok(PickupDraft {
            sender_id: self
                .sender_id
                .ok_or_else(|| DomainError::invalid_field("sender_id", "is required"))?,
            pickup_address: self.pickup_address,
            destination: self.destination,
            pieces: self
                .pieces
                .ok_or_else(|| DomainError::invalid_field("pieces", "is required"))?,
            requested_at: self.requested_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePickupRequest {
    pub sender_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub pickup_address: Option<String>,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub destination: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub pieces: Option<u32>,
    pub requested_at: Option<DateTime<Utc>>,
}

impl UpdatePickupRequest {
    pub fn into_changes(self) -> Result<PickupChanges, DomainError> {
        validate_input(&self, FieldErrors::new())?;

        Ok(PickupChanges {
            sender_id: self.sender_id,
            pickup_address: self.pickup_address,
            destination: self.destination,
            pieces: self.pieces,
            requested_at: self.requested_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePickupStatusRequest {
    pub status: Option<String>,
}

impl UpdatePickupStatusRequest {
    pub fn parse(&self) -> Result<PickupStatus, DomainError> {
        let raw = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DomainError::invalid_field("status", "is required"))?;

        raw.parse::<PickupStatus>()
            .map_err(|_| DomainError::invalid_field("status", "must be one of PENDING, FINISH"))
    }
}
