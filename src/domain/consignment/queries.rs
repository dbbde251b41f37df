use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Operation, Session};
use crate::directory::Directory;
use crate::error::DomainError;
use crate::pagination::{Page, PageRequest};

use super::aggregate::ConsignmentNote;
use super::numbering::NumberRegistry;
use super::projection::{ConsignmentFilter, ConsignmentProjection};
use super::value_objects::ConsignmentStatus;

// ============================================================================
// Consignment Queries - read path joined with directory names
// ============================================================================

/// Consignment note with the names of everything it references
#[derive(Debug, Clone, Serialize)]
pub struct ConsignmentRecord {
    #[serde(flatten)]
    pub note: ConsignmentNote,
    pub origin_branch_name: Option<String>,
    pub destination_branch_name: Option<String>,
    pub owning_branch_name: Option<String>,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub created_by_name: Option<String>,
    pub forwarder_name: Option<String>,
    pub truck_plate_number: Option<String>,
}

/// Public tracking view. Carries no pricing or ownership fields.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingSummary {
    pub number: String,
    pub barcode: String,
    pub status: ConsignmentStatus,
    pub origin_branch_name: Option<String>,
    pub destination_branch_name: Option<String>,
    pub item_name: String,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
}

pub struct ConsignmentQueries {
    projection: Arc<ConsignmentProjection>,
    numbers: Arc<NumberRegistry>,
    directory: Arc<dyn Directory>,
    gate: AuthorizationGate,
}

impl ConsignmentQueries {
    pub fn new(
        projection: Arc<ConsignmentProjection>,
        numbers: Arc<NumberRegistry>,
        directory: Arc<dyn Directory>,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            projection,
            numbers,
            directory,
            gate,
        }
    }

    /// Non-privileged callers only ever see their own branch
    pub async fn list(
        &self,
        mut filter: ConsignmentFilter,
        page: PageRequest,
        session: &Session,
    ) -> Result<Page<ConsignmentRecord>, DomainError> {
        self.gate.authorize(session, Operation::ReadConsignments)?;
        filter.branch_id = self.gate.scope_branch(session, filter.branch_id);

        let matched = self.projection.query(&filter).await;
        let page = page.slice(matched);

        let mut records = Vec::with_capacity(page.items.len());
        for note in &page.items {
            records.push(self.join(note.clone()).await?);
        }

        tracing::debug!(
            user_id = %session.user_id,
            total = page.total,
            returned = records.len(),
            "Listed consignments"
        );

        Ok(Page {
            items: records,
            total: page.total,
            request: page.request,
        })
    }

    pub async fn get(&self, consignment_id: Uuid, session: &Session) -> Result<ConsignmentRecord, DomainError> {
        self.gate.authorize(session, Operation::ReadConsignments)?;
        let note = self
            .projection
            .get(consignment_id)
            .await
            .ok_or_else(|| DomainError::not_found("consignment", "id", consignment_id))?;
        self.gate
            .ensure_branch_access(session, Operation::ReadConsignments, &note.involved_branches())?;

        self.join(note).await
    }

    /// Unauthenticated lookup by exact number
    pub async fn track(&self, number: &str) -> Result<TrackingSummary, DomainError> {
        let note = match self.numbers.lookup(number).await {
            Some(id) => self.projection.get(id).await,
            None => None,
        }
        .ok_or_else(|| DomainError::not_found("consignment", "number", number.trim()))?;

        let record = self.join(note).await?;
        Ok(TrackingSummary {
            number: record.note.number.as_str().to_string(),
            barcode: record.note.barcode,
            status: record.note.status,
            origin_branch_name: record.origin_branch_name,
            destination_branch_name: record.destination_branch_name,
            item_name: record.note.cargo.item_name,
            sender_name: record.sender_name,
            recipient_name: record.recipient_name,
            created_at: record.note.created_at,
            updated_at: record.note.updated_at,
            assigned_at: record.note.assigned_at,
        })
    }

    pub async fn join(&self, note: ConsignmentNote) -> Result<ConsignmentRecord, DomainError> {
        let directory = self.directory.as_ref();

        let origin_branch_name = directory.branch(note.origin_branch_id).await?.map(|b| b.name);
        let destination_branch_name = directory.branch(note.destination_branch_id).await?.map(|b| b.name);
        let owning_branch_name = directory.branch(note.owning_branch_id).await?.map(|b| b.name);
        let sender_name = directory.customer(note.sender_id).await?.map(|c| c.name);
        let recipient_name = directory.customer(note.recipient_id).await?.map(|c| c.name);
        let created_by_name = directory.user(note.created_by).await?.map(|u| u.name);
        let forwarder_name = match note.forwarding.forwarder_id {
            Some(id) => directory.forwarder(id).await?.map(|f| f.name),
            None => None,
        };
        let truck_plate_number = match note.truck_id {
            Some(id) => directory.truck(id).await?.map(|t| t.plate_number),
            None => None,
        };

        Ok(ConsignmentRecord {
            note,
            origin_branch_name,
            destination_branch_name,
            owning_branch_name,
            sender_name,
            recipient_name,
            created_by_name,
            forwarder_name,
            truck_plate_number,
        })
    }
}
