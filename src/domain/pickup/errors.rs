use crate::error::DomainError;

// ============================================================================
// Pickup Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PickupError {
    #[error("Piece count must be at least 1")]
    InvalidPieces,

    #[error("Pickup address cannot be empty")]
    EmptyAddress,

    #[error("Destination cannot be empty")]
    EmptyDestination,

    #[error("Pickup request is finished and can no longer be changed")]
    Locked,

    #[error("Pickup request has been deleted")]
    Deleted,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl From<PickupError> for DomainError {
    fn from(error: PickupError) -> Self {
        match error {
            PickupError::InvalidPieces => DomainError::invalid_field("pieces", error.to_string()),
            PickupError::EmptyAddress => DomainError::invalid_field("pickup_address", error.to_string()),
            PickupError::EmptyDestination => DomainError::invalid_field("destination", error.to_string()),
            PickupError::Locked => DomainError::Conflict(error.to_string()),
            PickupError::Deleted | PickupError::NotInitialized => DomainError::Internal(error.to_string()),
        }
    }
}
