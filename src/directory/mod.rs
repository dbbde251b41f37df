// ============================================================================
// Directory Services - read-only reference data
// ============================================================================
//
// Branches, customers, forwarders, trucks and users. Every other component
// resolves references through the `Directory` trait; none of them own this
// data. Lookups must never report a deleted record as present.
//
// ============================================================================

mod guard;
mod memory;

pub use guard::CustomerDeletionGuard;
pub use memory::InMemoryDirectory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    /// Short code used as the consignment number prefix, e.g. "JKT"
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub branch_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forwarder {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: Uuid,
    pub plate_number: String,
    pub branch_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub branch_id: Uuid,
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn branch(&self, id: Uuid) -> Result<Option<Branch>, DomainError>;
    async fn customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    async fn forwarder(&self, id: Uuid) -> Result<Option<Forwarder>, DomainError>;
    async fn truck(&self, id: Uuid) -> Result<Option<Truck>, DomainError>;
    async fn user(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Remove a customer record. Callers go through `CustomerDeletionGuard`.
    async fn remove_customer(&self, id: Uuid) -> Result<bool, DomainError>;
}

// ============================================================================
// Resolution helpers - NOT_FOUND names the field that carried the reference
// ============================================================================

pub async fn require_branch(
    directory: &dyn Directory,
    id: Uuid,
    field: &'static str,
) -> Result<Branch, DomainError> {
    directory
        .branch(id)
        .await?
        .ok_or_else(|| DomainError::not_found("branch", field, id))
}

pub async fn require_customer(
    directory: &dyn Directory,
    id: Uuid,
    field: &'static str,
) -> Result<Customer, DomainError> {
    directory
        .customer(id)
        .await?
        .ok_or_else(|| DomainError::not_found("customer", field, id))
}

pub async fn require_forwarder(
    directory: &dyn Directory,
    id: Uuid,
    field: &'static str,
) -> Result<Forwarder, DomainError> {
    directory
        .forwarder(id)
        .await?
        .ok_or_else(|| DomainError::not_found("forwarder", field, id))
}

pub async fn require_truck(
    directory: &dyn Directory,
    id: Uuid,
    field: &'static str,
) -> Result<Truck, DomainError> {
    directory
        .truck(id)
        .await?
        .ok_or_else(|| DomainError::not_found("truck", field, id))
}
