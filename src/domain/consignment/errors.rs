use super::value_objects::ConsignmentStatus;
use crate::error::DomainError;

// ============================================================================
// Consignment Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConsignmentError {
    #[error("Weight must be greater than 0 kg")]
    InvalidWeight,

    #[error("Piece count must be at least 1")]
    InvalidPieces,

    #[error("Rate per kg cannot be negative")]
    NegativeRate,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Rate x weight exceeds the supported price range")]
    PriceOutOfRange,

    #[error("Forwarded consignments must name a forwarder")]
    ForwarderRequired,

    #[error("Direct consignments cannot name a forwarder")]
    ForwarderNotAllowed,

    #[error("Cannot load a consignment in status {0}")]
    AlreadyClosed(ConsignmentStatus),

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl ConsignmentError {
    /// Request field the rule is about, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConsignmentError::InvalidWeight => Some("weight_kg"),
            ConsignmentError::InvalidPieces => Some("pieces"),
            ConsignmentError::NegativeRate => Some("rate_per_kg"),
            ConsignmentError::NegativePrice | ConsignmentError::PriceOutOfRange => Some("price"),
            ConsignmentError::ForwarderRequired | ConsignmentError::ForwarderNotAllowed => {
                Some("forwarder_id")
            }
            ConsignmentError::AlreadyClosed(_) | ConsignmentError::NotInitialized => None,
        }
    }
}

impl From<ConsignmentError> for DomainError {
    fn from(error: ConsignmentError) -> Self {
        match (&error, error.field()) {
            (_, Some(field)) => DomainError::invalid_field(field, error.to_string()),
            (ConsignmentError::AlreadyClosed(_), None) => DomainError::Conflict(error.to_string()),
            _ => DomainError::Internal(error.to_string()),
        }
    }
}
