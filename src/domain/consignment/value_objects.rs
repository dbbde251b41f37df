use std::fmt;
use std::str::FromStr;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Consignment Value Objects
// ============================================================================

/// Consignment note status.
///
/// Standard path: `PENDING -> MUAT -> TRANSIT -> LANSIR -> TERKIRIM`, with
/// `RETURN` reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsignmentStatus {
    #[serde(rename = "PENDING")]
    Pending,
    /// Loaded onto a truck
    #[serde(rename = "MUAT")]
    Loaded,
    #[serde(rename = "TRANSIT")]
    Transit,
    /// Out for delivery
    #[serde(rename = "LANSIR")]
    OutForDelivery,
    #[serde(rename = "TERKIRIM")]
    Delivered,
    #[serde(rename = "RETURN")]
    Returned,
}

impl ConsignmentStatus {
    pub const ALL: [ConsignmentStatus; 6] = [
        ConsignmentStatus::Pending,
        ConsignmentStatus::Loaded,
        ConsignmentStatus::Transit,
        ConsignmentStatus::OutForDelivery,
        ConsignmentStatus::Delivered,
        ConsignmentStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsignmentStatus::Pending => "PENDING",
            ConsignmentStatus::Loaded => "MUAT",
            ConsignmentStatus::Transit => "TRANSIT",
            ConsignmentStatus::OutForDelivery => "LANSIR",
            ConsignmentStatus::Delivered => "TERKIRIM",
            ConsignmentStatus::Returned => "RETURN",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsignmentStatus::Delivered | ConsignmentStatus::Returned)
    }

    /// Waiting to be put on a truck
    pub fn is_assignable(&self) -> bool {
        matches!(self, ConsignmentStatus::Pending)
    }

    /// Whether `self -> next` is an edge of the standard lifecycle.
    /// Off-path transitions are still accepted, only flagged in the audit log.
    pub fn is_standard_transition(&self, next: ConsignmentStatus) -> bool {
        use ConsignmentStatus::*;
        matches!(
            (*self, next),
            (Pending, Loaded)
                | (Loaded, Transit)
                | (Transit, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Pending | Loaded | Transit | OutForDelivery, Returned)
        )
    }
}

impl fmt::Display for ConsignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ConsignmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnCreation,
    CashOnDelivery,
    CashAfterDelivery,
}

/// Whether the consignment is handed to a third-party carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwarderCode {
    #[default]
    Direct,
    Forwarded,
}

/// Forwarder hand-off: a `Forwarded` consignment names its carrier,
/// a `Direct` one never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Forwarding {
    pub code: ForwarderCode,
    pub forwarder_id: Option<uuid::Uuid>,
}

impl Forwarding {
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn forwarded(forwarder_id: uuid::Uuid) -> Self {
        Self {
            code: ForwarderCode::Forwarded,
            forwarder_id: Some(forwarder_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub item_name: String,
    pub commodity: String,
    pub packing: String,
    pub pieces: u32,
    pub weight_kg: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub rate_per_kg: Decimal,
    pub price: Decimal,
    /// True when `price` was computed as rate x weight rather than supplied
    pub price_derived: bool,
}

impl Pricing {
    /// `None` when rate x weight leaves the decimal range
    pub fn derive(rate_per_kg: Decimal, weight_kg: Decimal) -> Option<Self> {
        Some(Self {
            rate_per_kg,
            price: rate_per_kg.checked_mul(weight_kg)?,
            price_derived: true,
        })
    }

    pub fn explicit(rate_per_kg: Decimal, price: Decimal) -> Self {
        Self {
            rate_per_kg,
            price,
            price_derived: false,
        }
    }
}

/// Human-readable consignment number: `<BRANCH CODE><YYMMDD><SEQUENCE>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsignmentNumber(String);

impl ConsignmentNumber {
    pub const SEQUENCE_WIDTH: usize = 5;

    pub fn prefix(branch_code: &str, date: NaiveDate) -> String {
        format!("{}{}", branch_code.trim().to_ascii_uppercase(), date.format("%y%m%d"))
    }

    pub fn compose(prefix: &str, sequence: u32) -> Self {
        Self(format!("{}{:0width$}", prefix, sequence, width = Self::SEQUENCE_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code 39 payload printed on the label
    pub fn barcode(&self) -> String {
        format!("*{}*", self.0)
    }
}

impl fmt::Display for ConsignmentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
