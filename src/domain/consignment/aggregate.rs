use serde::Serialize;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::event_sourcing::core::Aggregate;
use super::value_objects::{
    Cargo, ConsignmentNumber, ConsignmentStatus, ForwarderCode, Forwarding, PaymentMethod, Pricing,
};
use super::events::*;
use super::commands::{ConsignmentCommand, ConsignmentPatch, RegisterConsignment};
use super::errors::ConsignmentError;

// ============================================================================
// Consignment Note Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConsignmentNote {
    // Identity
    pub id: Uuid,
    pub version: i64,
    pub number: ConsignmentNumber,
    pub barcode: String,

    // Route & parties
    pub origin_branch_id: Uuid,
    pub destination_branch_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,

    pub cargo: Cargo,
    pub pricing: Pricing,
    pub payment_method: PaymentMethod,
    pub forwarding: Forwarding,

    // Ownership (from the session, never from input)
    pub created_by: Uuid,
    pub owning_branch_id: Uuid,

    pub status: ConsignmentStatus,
    pub truck_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConsignmentNote {
    /// Validate a registration and settle its price without emitting anything
    pub fn check_registration(command: &RegisterConsignment) -> Result<Pricing, ConsignmentError> {
        Self::validate_cargo(command.cargo.pieces, command.cargo.weight_kg)?;
        Self::validate_pricing(command.rate_per_kg, command.price)?;
        Self::validate_forwarding(&command.forwarding)?;

        match command.price {
            Some(price) => Ok(Pricing::explicit(command.rate_per_kg, price)),
            None => Self::derive_price(command.rate_per_kg, command.cargo.weight_kg),
        }
    }

    /// Emit the opening event under an issued number
    pub fn register(
        command: &RegisterConsignment,
        number: ConsignmentNumber,
    ) -> Result<ConsignmentEvent, ConsignmentError> {
        let pricing = Self::check_registration(command)?;

        Ok(ConsignmentEvent::Created(ConsignmentCreated {
            consignment_id: command.consignment_id,
            barcode: number.barcode(),
            number,
            origin_branch_id: command.origin_branch_id,
            destination_branch_id: command.destination_branch_id,
            sender_id: command.sender_id,
            recipient_id: command.recipient_id,
            cargo: command.cargo.clone(),
            pricing,
            payment_method: command.payment_method,
            forwarding: command.forwarding,
            created_by: command.created_by,
            owning_branch_id: command.owning_branch_id,
            created_at: Utc::now(),
        }))
    }

    /// Branches whose staff may touch this consignment
    pub fn involved_branches(&self) -> [Uuid; 3] {
        [self.owning_branch_id, self.origin_branch_id, self.destination_branch_id]
    }

    fn validate_cargo(pieces: u32, weight_kg: Decimal) -> Result<(), ConsignmentError> {
        if pieces < 1 {
            return Err(ConsignmentError::InvalidPieces);
        }
        if weight_kg <= Decimal::ZERO {
            return Err(ConsignmentError::InvalidWeight);
        }
        Ok(())
    }

    fn validate_pricing(rate_per_kg: Decimal, price: Option<Decimal>) -> Result<(), ConsignmentError> {
        if rate_per_kg < Decimal::ZERO {
            return Err(ConsignmentError::NegativeRate);
        }
        if price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(ConsignmentError::NegativePrice);
        }
        Ok(())
    }

    fn derive_price(rate_per_kg: Decimal, weight_kg: Decimal) -> Result<Pricing, ConsignmentError> {
        Pricing::derive(rate_per_kg, weight_kg).ok_or(ConsignmentError::PriceOutOfRange)
    }

    fn validate_forwarding(forwarding: &Forwarding) -> Result<(), ConsignmentError> {
        match (forwarding.code, forwarding.forwarder_id) {
            (ForwarderCode::Direct, Some(_)) => Err(ConsignmentError::ForwarderNotAllowed),
            (ForwarderCode::Forwarded, None) => Err(ConsignmentError::ForwarderRequired),
            _ => Ok(()),
        }
    }

    /// Resolve a raw patch against current state.
    ///
    /// Rate and weight both present: price is recomputed and wins over any
    /// price in the same patch. Otherwise an explicit price is trusted, and a
    /// lone rate or weight change re-derives the price from merged values.
    fn resolve_patch(&self, patch: &ConsignmentPatch) -> Result<ConsignmentChanges, ConsignmentError> {
        let weight_kg = patch.weight_kg.unwrap_or(self.cargo.weight_kg);
        let pieces = patch.pieces.unwrap_or(self.cargo.pieces);
        let rate_per_kg = patch.rate_per_kg.unwrap_or(self.pricing.rate_per_kg);

        Self::validate_cargo(pieces, weight_kg)?;
        Self::validate_pricing(rate_per_kg, patch.price)?;
        if let Some(forwarding) = &patch.forwarding {
            Self::validate_forwarding(forwarding)?;
        }

        let pricing = match (patch.rate_per_kg, patch.weight_kg, patch.price) {
            (Some(rate), Some(weight), _) => Some(Self::derive_price(rate, weight)?),
            (_, _, Some(price)) => Some(Pricing::explicit(rate_per_kg, price)),
            (Some(_), None, None) | (None, Some(_), None) => {
                Some(Self::derive_price(rate_per_kg, weight_kg)?)
            }
            (None, None, None) => None,
        };

        Ok(ConsignmentChanges {
            origin_branch_id: patch.origin_branch_id,
            destination_branch_id: patch.destination_branch_id,
            sender_id: patch.sender_id,
            recipient_id: patch.recipient_id,
            item_name: patch.item_name.clone(),
            commodity: patch.commodity.clone(),
            packing: patch.packing.clone(),
            pieces: patch.pieces,
            weight_kg: patch.weight_kg,
            pricing,
            payment_method: patch.payment_method,
            forwarding: patch.forwarding,
        })
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for ConsignmentNote {
    type Event = ConsignmentEvent;
    type Command = ConsignmentCommand;
    type Error = ConsignmentError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            ConsignmentEvent::Created(e) => Ok(Self {
                id: e.consignment_id,
                version: 0,
                number: e.number.clone(),
                barcode: e.barcode.clone(),
                origin_branch_id: e.origin_branch_id,
                destination_branch_id: e.destination_branch_id,
                sender_id: e.sender_id,
                recipient_id: e.recipient_id,
                cargo: e.cargo.clone(),
                pricing: e.pricing.clone(),
                payment_method: e.payment_method,
                forwarding: e.forwarding,
                created_by: e.created_by,
                owning_branch_id: e.owning_branch_id,
                status: ConsignmentStatus::Pending,
                truck_id: None,
                assigned_at: None,
                created_at: e.created_at,
                updated_at: e.created_at,
            }),
            _ => Err(ConsignmentError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ConsignmentEvent::Created(_) => {
                // First event already applied
            }
            ConsignmentEvent::Updated(e) => {
                let c = &e.changes;
                if let Some(id) = c.origin_branch_id {
                    self.origin_branch_id = id;
                }
                if let Some(id) = c.destination_branch_id {
                    self.destination_branch_id = id;
                }
                if let Some(id) = c.sender_id {
                    self.sender_id = id;
                }
                if let Some(id) = c.recipient_id {
                    self.recipient_id = id;
                }
                if let Some(ref name) = c.item_name {
                    self.cargo.item_name = name.clone();
                }
                if let Some(ref commodity) = c.commodity {
                    self.cargo.commodity = commodity.clone();
                }
                if let Some(ref packing) = c.packing {
                    self.cargo.packing = packing.clone();
                }
                if let Some(pieces) = c.pieces {
                    self.cargo.pieces = pieces;
                }
                if let Some(weight) = c.weight_kg {
                    self.cargo.weight_kg = weight;
                }
                if let Some(ref pricing) = c.pricing {
                    self.pricing = pricing.clone();
                }
                if let Some(method) = c.payment_method {
                    self.payment_method = method;
                }
                if let Some(forwarding) = c.forwarding {
                    self.forwarding = forwarding;
                }
                self.updated_at = e.updated_at;
            }
            ConsignmentEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.changed_at;
            }
            ConsignmentEvent::TruckAssigned(e) => {
                self.status = ConsignmentStatus::Loaded;
                self.truck_id = Some(e.truck_id);
                self.assigned_at = Some(e.assigned_at);
                self.updated_at = e.assigned_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ConsignmentCommand::Update { patch } => {
                let changes = self.resolve_patch(patch)?;
                if changes.is_empty() {
                    return Ok(vec![]); // No change
                }

                Ok(vec![ConsignmentEvent::Updated(ConsignmentUpdated {
                    changes,
                    updated_at: Utc::now(),
                })])
            }

            // Any status is reachable from any other; only membership is enforced
            ConsignmentCommand::ChangeStatus { status } => {
                if *status == self.status {
                    return Ok(vec![]);
                }

                Ok(vec![ConsignmentEvent::StatusChanged(ConsignmentStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_at: Utc::now(),
                })])
            }

            // Reassignment overwrites truck and timestamp (last write wins)
            ConsignmentCommand::AssignTruck { truck_id } => {
                if self.status.is_terminal() {
                    return Err(ConsignmentError::AlreadyClosed(self.status));
                }

                Ok(vec![ConsignmentEvent::TruckAssigned(ConsignmentTruckAssigned {
                    truck_id: *truck_id,
                    previous_truck_id: self.truck_id,
                    from: self.status,
                    assigned_at: Utc::now(),
                })])
            }
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

// ============================================================================
// Unit Tests
// ============================================================================
