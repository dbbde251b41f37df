use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthorizationGate, Operation, Session};
use crate::directory::{require_truck, Directory};
use crate::domain::consignment::{ConsignmentFilter, ConsignmentRecord, ConsignmentRegistry, ConsignmentStatus};
use crate::error::{validate_input, DomainError, FieldErrors};
use crate::metrics::Metrics;

// ============================================================================
// Queue Assignment Service
// ============================================================================
//
// Eligible consignments (PENDING) are listed oldest first; the order in
// which they are loaded is up to the operator. Assigning writes the truck
// onto the consignment (status MUAT) and keeps the latest movement record
// per consignment. Reassignment overwrites both. Ledger entries carry the
// consignment version they were written at, and an older version never
// replaces a newer one.
//
// ============================================================================

/// Latest physical movement record for a consignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckAssignment {
    pub consignment_id: Uuid,
    pub truck_id: Uuid,
    pub previous_truck_id: Option<Uuid>,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
    /// Consignment version produced by this assignment
    pub version: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssignTruckRequest {
    #[validate(required(message = "is required"))]
    pub consignment_id: Option<Uuid>,
    #[validate(required(message = "is required"))]
    pub truck_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRecord {
    pub assignment: TruckAssignment,
    pub consignment: ConsignmentRecord,
}

pub struct QueueAssignmentService {
    registry: Arc<ConsignmentRegistry>,
    directory: Arc<dyn Directory>,
    gate: AuthorizationGate,
    metrics: Arc<Metrics>,
    ledger: RwLock<HashMap<Uuid, TruckAssignment>>,
}

impl QueueAssignmentService {
    pub fn new(
        registry: Arc<ConsignmentRegistry>,
        directory: Arc<dyn Directory>,
        gate: AuthorizationGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            directory,
            gate,
            metrics,
            ledger: RwLock::new(HashMap::new()),
        }
    }

    pub async fn list_assignable(
        &self,
        branch_id: Option<Uuid>,
        session: &Session,
    ) -> Result<Vec<ConsignmentRecord>, DomainError> {
        self.metrics
            .instrument("list_assignable", async {
                self.gate.authorize(session, Operation::ReadQueue)?;

                let filter = ConsignmentFilter {
                    branch_id: self.gate.scope_branch(session, branch_id),
                    status: Some(ConsignmentStatus::Pending),
                    ..Default::default()
                };

                // Projection returns newest first; the queue reads oldest first
                let mut eligible = self.registry.projection().query(&filter).await;
                eligible.retain(|n| n.status.is_assignable());
                eligible.reverse();

                let mut records = Vec::with_capacity(eligible.len());
                for note in eligible {
                    records.push(self.registry.join(note).await?);
                }
                Ok(records)
            })
            .await
    }

    pub async fn assign(&self, request: AssignTruckRequest, session: &Session) -> Result<AssignmentRecord, DomainError> {
        self.metrics
            .instrument("assign_truck", async {
                self.gate.authorize(session, Operation::AssignTruck)?;
                validate_input(&request, FieldErrors::new())?;
                let (Some(consignment_id), Some(truck_id)) = (request.consignment_id, request.truck_id) else {
                    return Err(DomainError::invalid_field("consignment_id", "is required"));
                };

                let truck = require_truck(self.directory.as_ref(), truck_id, "truck_id").await?;
                let (note, previous_truck_id) =
                    self.registry.assign_truck(consignment_id, truck.id, session).await?;

                let assignment = TruckAssignment {
                    consignment_id,
                    truck_id: truck.id,
                    previous_truck_id,
                    assigned_by: session.user_id,
                    assigned_at: note.assigned_at.unwrap_or_else(Utc::now),
                    version: note.version,
                };
                self.record(assignment.clone()).await;

                tracing::info!(
                    consignment_id = %consignment_id,
                    number = %note.number,
                    truck_id = %truck.id,
                    plate_number = %truck.plate_number,
                    previous_truck_id = ?assignment.previous_truck_id,
                    user_id = %session.user_id,
                    "Consignment assigned to truck"
                );

                let consignment = self.registry.join(note).await?;
                Ok(AssignmentRecord { assignment, consignment })
            })
            .await
    }

    /// Latest movement record for a consignment the caller can see
    pub async fn assignment(&self, consignment_id: Uuid, session: &Session) -> Result<TruckAssignment, DomainError> {
        self.metrics
            .instrument("get_truck_assignment", async {
                self.gate.authorize(session, Operation::ReadQueue)?;

                let note = self
                    .registry
                    .projection()
                    .get(consignment_id)
                    .await
                    .ok_or_else(|| DomainError::not_found("consignment", "id", consignment_id))?;
                self.gate
                    .ensure_branch_access(session, Operation::ReadQueue, &note.involved_branches())?;

                self.ledger
                    .read()
                    .await
                    .get(&consignment_id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("truck_assignment", "consignment_id", consignment_id))
            })
            .await
    }

    /// Store `assignment` unless the ledger already holds a later version.
    /// Returns whether it was stored.
    async fn record(&self, assignment: TruckAssignment) -> bool {
        let mut ledger = self.ledger.write().await;
        match ledger.get(&assignment.consignment_id) {
            Some(current) if current.version >= assignment.version => {
                tracing::debug!(
                    consignment_id = %assignment.consignment_id,
                    stored_version = current.version,
                    incoming_version = assignment.version,
                    "Skipping stale truck assignment"
                );
                false
            }
            _ => {
                ledger.insert(assignment.consignment_id, assignment);
                true
            }
        }
    }
}
