use std::sync::Arc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Session};
use crate::directory::Directory;
use crate::error::DomainError;
use crate::event_sourcing::store::EventStore;
use crate::metrics::Metrics;

use super::aggregate::PickupRequest;
use super::command_handler::PickupCommandHandler;
use super::projection::PickupProjection;
use super::requests::{CreatePickupRequest, UpdatePickupRequest, UpdatePickupStatusRequest};

// ============================================================================
// Pickup Intake - records demand ahead of consignment creation
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PickupRecord {
    #[serde(flatten)]
    pub request: PickupRequest,
    pub sender_name: Option<String>,
    pub owning_branch_name: Option<String>,
    pub created_by_name: Option<String>,
}

pub struct PickupIntake {
    commands: PickupCommandHandler,
    directory: Arc<dyn Directory>,
    metrics: Arc<Metrics>,
}

impl PickupIntake {
    pub fn new(directory: Arc<dyn Directory>, gate: AuthorizationGate, metrics: Arc<Metrics>) -> Self {
        let commands = PickupCommandHandler::new(
            Arc::new(EventStore::new("PickupRequest")),
            Arc::new(PickupProjection::new()),
            directory.clone(),
            gate,
            metrics.clone(),
        );

        Self {
            commands,
            directory,
            metrics,
        }
    }

    pub async fn create(&self, request: CreatePickupRequest, session: &Session) -> Result<PickupRecord, DomainError> {
        self.metrics
            .instrument("create_pickup", async {
                let pickup = self.commands.create(request, session).await?;
                self.join(pickup).await
            })
            .await
    }

    pub async fn update(
        &self,
        pickup_id: Uuid,
        request: UpdatePickupRequest,
        session: &Session,
    ) -> Result<PickupRecord, DomainError> {
        self.metrics
            .instrument("update_pickup", async {
                let pickup = self.commands.update(pickup_id, request, session).await?;
                self.join(pickup).await
            })
            .await
    }

    pub async fn update_status(
        &self,
        pickup_id: Uuid,
        request: UpdatePickupStatusRequest,
        session: &Session,
    ) -> Result<PickupRecord, DomainError> {
        self.metrics
            .instrument("update_pickup_status", async {
                let pickup = self.commands.update_status(pickup_id, request, session).await?;
                self.join(pickup).await
            })
            .await
    }

    pub async fn delete(&self, pickup_id: Uuid, session: &Session) -> Result<(), DomainError> {
        self.metrics
            .instrument("delete_pickup", self.commands.delete(pickup_id, session))
            .await
    }

    pub async fn list_pending(
        &self,
        branch_id: Option<Uuid>,
        session: &Session,
    ) -> Result<Vec<PickupRecord>, DomainError> {
        self.metrics
            .instrument("list_pending_pickups", async {
                let pending = self.commands.list_pending(branch_id, session).await?;
                let mut records = Vec::with_capacity(pending.len());
                for pickup in pending {
                    records.push(self.join(pickup).await?);
                }
                Ok(records)
            })
            .await
    }

    async fn join(&self, request: PickupRequest) -> Result<PickupRecord, DomainError> {
        let sender_name = self.directory.customer(request.sender_id).await?.map(|c| c.name);
        let owning_branch_name = self.directory.branch(request.owning_branch_id).await?.map(|b| b.name);
        let created_by_name = self.directory.user(request.created_by).await?.map(|u| u.name);

        Ok(PickupRecord {
            request,
            sender_name,
            owning_branch_name,
            created_by_name,
        })
    }
}
