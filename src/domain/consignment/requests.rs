use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{validate_input, DomainError, FieldErrors};
use super::commands::ConsignmentPatch;
use super::value_objects::{Cargo, ConsignmentStatus, ForwarderCode, Forwarding, PaymentMethod};

// ============================================================================
// Consignment Input DTOs
// ============================================================================
//
// Ownership fields (creator, owning branch) are not part of any DTO; a body
// that carries them has those keys ignored on deserialization.
//
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateConsignmentRequest {
    #[validate(required(message = "is required"))]
    pub origin_branch_id: Option<Uuid>,
    #[validate(required(message = "is required"))]
    pub destination_branch_id: Option<Uuid>,
    #[validate(required(message = "is required"))]
    pub sender_id: Option<Uuid>,
    #[validate(required(message = "is required"))]
    pub recipient_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub item_name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub commodity: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub packing: String,

    #[validate(required(message = "is required"), range(min = 1, message = "must be at least 1"))]
    pub pieces: Option<u32>,
    #[validate(required(message = "is required"))]
    pub weight_kg: Option<Decimal>,
    #[validate(required(message = "is required"))]
    pub rate_per_kg: Option<Decimal>,
    /// Derived from rate x weight when absent
    pub price: Option<Decimal>,

    #[validate(required(message = "is required"))]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub forwarder_code: ForwarderCode,
    pub forwarder_id: Option<Uuid>,
}

/// Validated create input with every required field present
#[derive(Debug, Clone)]
pub struct ConsignmentDraft {
    pub origin_branch_id: Uuid,
    pub destination_branch_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub cargo: Cargo,
    pub rate_per_kg: Decimal,
    pub price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub forwarding: Forwarding,
}

impl CreateConsignmentRequest {
    pub fn into_draft(self) -> Result<ConsignmentDraft, DomainError> {
        let mut extra = FieldErrors::new();
        check_decimals(&mut extra, self.weight_kg, self.rate_per_kg, self.price);
        if self.forwarder_code == ForwarderCode::Forwarded && self.forwarder_id.is_none() {
            push(&mut extra, "forwarder_id", "is required when the consignment is forwarded");
        }
        if self.forwarder_code == ForwarderCode::Direct && self.forwarder_id.is_some() {
            push(&mut extra, "forwarder_id", "must be empty when there is no forwarder");
        }
        validate_input(&self, extra)?;

        Ok(ConsignmentDraft {
            origin_branch_id: required(self.origin_branch_id, "origin_branch_id")?,
            destination_branch_id: required(self.destination_branch_id, "destination_branch_id")?,
            sender_id: required(self.sender_id, "sender_id")?,
            recipient_id: required(self.recipient_id, "recipient_id")?,
            cargo: Cargo {
                item_name: self.item_name.trim().to_string(),
                commodity: self.commodity.trim().to_string(),
                packing: self.packing.trim().to_string(),
                pieces: required(self.pieces, "pieces")?,
                weight_kg: required(self.weight_kg, "weight_kg")?,
            },
            rate_per_kg: required(self.rate_per_kg, "rate_per_kg")?,
            price: self.price,
            payment_method: required(self.payment_method, "payment_method")?,
            forwarding: Forwarding {
                code: self.forwarder_code,
                forwarder_id: self.forwarder_id,
            },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateConsignmentRequest {
    pub origin_branch_id: Option<Uuid>,
    pub destination_branch_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub item_name: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub commodity: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub packing: Option<String>,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub pieces: Option<u32>,
    pub weight_kg: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
    pub price: Option<Decimal>,

    pub payment_method: Option<PaymentMethod>,
    pub forwarder_code: Option<ForwarderCode>,
    pub forwarder_id: Option<Uuid>,
}

impl UpdateConsignmentRequest {
    pub fn into_patch(self) -> Result<ConsignmentPatch, DomainError> {
        let mut extra = FieldErrors::new();
        check_decimals(&mut extra, self.weight_kg, self.rate_per_kg, self.price);
        validate_input(&self, extra)?;

        // Naming only a forwarder implies the consignment is forwarded
        let forwarding = match (self.forwarder_code, self.forwarder_id) {
            (None, None) => None,
            (Some(code), forwarder_id) => Some(Forwarding { code, forwarder_id }),
            (None, Some(id)) => Some(Forwarding::forwarded(id)),
        };

        Ok(ConsignmentPatch {
            origin_branch_id: self.origin_branch_id,
            destination_branch_id: self.destination_branch_id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            item_name: self.item_name.map(|s| s.trim().to_string()),
            commodity: self.commodity.map(|s| s.trim().to_string()),
            packing: self.packing.map(|s| s.trim().to_string()),
            pieces: self.pieces,
            weight_kg: self.weight_kg,
            rate_per_kg: self.rate_per_kg,
            price: self.price,
            payment_method: self.payment_method,
            forwarding,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl UpdateStatusRequest {
    /// Membership check only; any status may follow any other
    pub fn parse(&self) -> Result<ConsignmentStatus, DomainError> {
        let raw = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DomainError::invalid_field("status", "is required"))?;

        raw.parse::<ConsignmentStatus>().map_err(|_| {
            let allowed: Vec<&str> = ConsignmentStatus::ALL.iter().map(|s| s.as_str()).collect();
            DomainError::invalid_field("status", format!("must be one of {}", allowed.join(", ")))
        })
    }
}

fn check_decimals(
    errors: &mut FieldErrors,
    weight_kg: Option<Decimal>,
    rate_per_kg: Option<Decimal>,
    price: Option<Decimal>,
) {
    if weight_kg.is_some_and(|w| w <= Decimal::ZERO) {
        push(errors, "weight_kg", "must be greater than 0");
    }
    if rate_per_kg.is_some_and(|r| r < Decimal::ZERO) {
        push(errors, "rate_per_kg", "must not be negative");
    }
    if price.is_some_and(|p| p < Decimal::ZERO) {
        push(errors, "price", "must not be negative");
    }
}

fn push(errors: &mut FieldErrors, field: &str, problem: &str) {
    errors.entry(field.to_string()).or_default().push(problem.to_string());
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::invalid_field(field, "is required"))
}
