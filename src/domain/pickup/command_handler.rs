use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Operation, Session};
use crate::directory::{require_customer, Directory};
use crate::error::DomainError;
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::{EventStore, StoreError};
use crate::metrics::Metrics;

use super::aggregate::PickupRequest;
use super::commands::{PickupCommand, RequestPickup};
use super::events::PickupEvent;
use super::projection::PickupProjection;
use super::requests::{CreatePickupRequest, UpdatePickupRequest, UpdatePickupStatusRequest};

// ============================================================================
// Pickup Command Handler
// ============================================================================
//
// Orchestrates: Gate → Input → Aggregate → Events → Event Store → Read Model
//
// ============================================================================

pub struct PickupCommandHandler {
    event_store: Arc<EventStore<PickupEvent>>,
    projection: Arc<PickupProjection>,
    directory: Arc<dyn Directory>,
    gate: AuthorizationGate,
    metrics: Arc<Metrics>,
}

impl PickupCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<PickupEvent>>,
        projection: Arc<PickupProjection>,
        directory: Arc<dyn Directory>,
        gate: AuthorizationGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            projection,
            directory,
            gate,
            metrics,
        }
    }

    pub async fn create(&self, request: CreatePickupRequest, session: &Session) -> Result<PickupRequest, DomainError> {
        self.gate.authorize(session, Operation::CreatePickup)?;
        let draft = request.into_draft()?;
        require_customer(self.directory.as_ref(), draft.sender_id, "sender_id").await?;

        let command = RequestPickup {
            pickup_id: Uuid::new_v4(),
            sender_id: draft.sender_id,
            pickup_address: draft.pickup_address,
            destination: draft.destination,
            pieces: draft.pieces,
            requested_at: draft.requested_at,
            created_by: session.user_id,
            owning_branch_id: session.branch_id,
        };

        let event = PickupRequest::register(&command)?;
        let mut pickup = PickupRequest::apply_first_event(&event)?;

        let envelope = Self::envelope(pickup.id, 1, event, Uuid::now_v7(), session);
        let version = self.event_store.append_events(pickup.id, 0, vec![envelope]).await?;
        pickup.set_version(version);
        self.projection.upsert(pickup.clone()).await;

        self.metrics.record_pickup_operation("create");
        tracing::info!(
            pickup_id = %pickup.id,
            owning_branch_id = %pickup.owning_branch_id,
            pieces = pickup.pieces,
            "Pickup request created"
        );

        Ok(pickup)
    }

    pub async fn update(
        &self,
        pickup_id: Uuid,
        request: UpdatePickupRequest,
        session: &Session,
    ) -> Result<PickupRequest, DomainError> {
        self.gate.authorize(session, Operation::UpdatePickup)?;

        // A finished request is CONFLICT whatever the patch holds
        let pickup = self.load(pickup_id).await?;
        self.gate
            .ensure_branch_access(session, Operation::UpdatePickup, &[pickup.owning_branch_id])?;
        pickup.ensure_open()?;

        let changes = request.into_changes()?;
        if let Some(sender_id) = changes.sender_id {
            require_customer(self.directory.as_ref(), sender_id, "sender_id").await?;
        }

        let pickup = self.execute(pickup, PickupCommand::Update { changes }, session).await?;
        self.metrics.record_pickup_operation("update");
        Ok(pickup)
    }

    /// Status is checked for membership before the request is looked up
    pub async fn update_status(
        &self,
        pickup_id: Uuid,
        request: UpdatePickupStatusRequest,
        session: &Session,
    ) -> Result<PickupRequest, DomainError> {
        self.gate.authorize(session, Operation::UpdatePickupStatus)?;
        let status = request.parse()?;

        let pickup = self.load(pickup_id).await?;
        self.gate
            .ensure_branch_access(session, Operation::UpdatePickupStatus, &[pickup.owning_branch_id])?;

        let from = pickup.status;
        let pickup = self.execute(pickup, PickupCommand::ChangeStatus { status }, session).await?;

        self.metrics.record_pickup_operation("update_status");
        if from != pickup.status {
            tracing::info!(
                pickup_id = %pickup.id,
                from = %from,
                to = %pickup.status,
                user_id = %session.user_id,
                "Pickup request status changed"
            );
        }
        Ok(pickup)
    }

    pub async fn delete(&self, pickup_id: Uuid, session: &Session) -> Result<(), DomainError> {
        self.gate.authorize(session, Operation::DeletePickup)?;

        let pickup = self.load(pickup_id).await?;
        self.gate
            .ensure_branch_access(session, Operation::DeletePickup, &[pickup.owning_branch_id])?;

        self.execute(pickup, PickupCommand::Delete, session).await?;

        self.metrics.record_pickup_operation("delete");
        tracing::info!(pickup_id = %pickup_id, user_id = %session.user_id, "Pickup request deleted");
        Ok(())
    }

    /// Central roles see every branch unless they narrow it themselves
    pub async fn list_pending(
        &self,
        branch_id: Option<Uuid>,
        session: &Session,
    ) -> Result<Vec<PickupRequest>, DomainError> {
        self.gate.authorize(session, Operation::ReadPickups)?;
        let scope = self.gate.scope_branch(session, branch_id);
        Ok(self.projection.pending(scope).await)
    }

    async fn load(&self, pickup_id: Uuid) -> Result<PickupRequest, DomainError> {
        let pickup = match self.event_store.load_aggregate::<PickupRequest>(pickup_id).await {
            Ok(pickup) => pickup,
            Err(StoreError::AggregateNotFound(_)) => {
                return Err(DomainError::not_found("pickup_request", "id", pickup_id))
            }
            Err(other) => return Err(other.into()),
        };

        if pickup.deleted {
            return Err(DomainError::not_found("pickup_request", "id", pickup_id));
        }
        Ok(pickup)
    }

    async fn execute(
        &self,
        pickup: PickupRequest,
        command: PickupCommand,
        session: &Session,
    ) -> Result<PickupRequest, DomainError> {
        let expected_version = pickup.version();
        let events = pickup.handle_command(&command)?;

        if events.is_empty() {
            tracing::debug!(pickup_id = %pickup.id, command = command.name(), "Command produced no change");
            return Ok(pickup);
        }

        let correlation_id = Uuid::now_v7();
        let mut pickup = pickup;
        let mut envelopes = Vec::with_capacity(events.len());
        let mut seq = expected_version;

        for event in events {
            seq += 1;
            pickup.apply_event(&event)?;
            envelopes.push(Self::envelope(pickup.id, seq, event, correlation_id, session));
        }

        let new_version = self
            .event_store
            .append_events(pickup.id, expected_version, envelopes)
            .await?;

        pickup.set_version(new_version);
        self.projection.upsert(pickup.clone()).await;
        Ok(pickup)
    }

    fn envelope(
        aggregate_id: Uuid,
        sequence_number: i64,
        event: PickupEvent,
        correlation_id: Uuid,
        session: &Session,
    ) -> EventEnvelope<PickupEvent> {
        let event_type = event.variant_name().to_string();
        EventEnvelope::new(aggregate_id, sequence_number, event_type, event, correlation_id)
            .with_user(session.user_id)
            .with_metadata("role", session.role.as_str())
            .with_metadata("branch_id", session.branch_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pickup::value_objects::PickupStatus;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;

    fn handler(fixture: &Fixture) -> PickupCommandHandler {
        PickupCommandHandler::new(
            Arc::new(EventStore::new("PickupRequest")),
            Arc::new(PickupProjection::new()),
            fixture.directory.clone(),
            AuthorizationGate::new(fixture.metrics.clone()),
            fixture.metrics.clone(),
        )
    }

    fn finish() -> UpdatePickupStatusRequest {
        UpdatePickupStatusRequest { status: Some("FINISH".to_string()) }
    }

    #[tokio::test]
    async fn test_create_defaults_to_pending_with_session_ownership() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);

        let pickup = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();
        assert_eq!(pickup.status, PickupStatus::Pending);
        assert_eq!(pickup.owning_branch_id, fixture.jakarta.id);
        assert_eq!(pickup.created_by, fixture.admin_jkt.user_id);
    }

    #[tokio::test]
    async fn test_create_requires_known_sender() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);

        let mut request = fixture.pickup_request();
        request.sender_id = Some(Uuid::new_v4());
        let err = handler.create(request, &fixture.admin_jkt).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { field: "sender_id", .. }));
    }

    #[tokio::test]
    async fn test_finished_request_cannot_be_updated_or_deleted() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);
        let pickup = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();

        handler.update_status(pickup.id, finish(), &fixture.courier_jkt).await.unwrap();

        let update = UpdatePickupRequest { pieces: Some(10), ..Default::default() };
        let err = handler.update(pickup.id, update, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = handler.delete(pickup.id, &fixture.head_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let stored = handler.projection.get(pickup.id).await.unwrap();
        assert_eq!(stored.pieces, pickup.pieces);
        assert_eq!(stored.status, PickupStatus::Finish);
    }

    #[tokio::test]
    async fn test_finished_request_rejects_any_patch_as_conflict() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);
        let pickup = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();
        handler.update_status(pickup.id, finish(), &fixture.courier_jkt).await.unwrap();

        let invalid = UpdatePickupRequest { pieces: Some(0), ..Default::default() };
        let err = handler.update(pickup.id, invalid, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let unknown_sender = UpdatePickupRequest { sender_id: Some(Uuid::new_v4()), ..Default::default() };
        let err = handler.update(pickup.id, unknown_sender, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // An open request still reports the bad input
        let open = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();
        let invalid = UpdatePickupRequest { pieces: Some(0), ..Default::default() };
        let err = handler.update(open.id, invalid, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_status_validated_before_lookup() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);

        let bogus = UpdatePickupStatusRequest { status: Some("LOST".to_string()) };
        let err = handler.update_status(Uuid::new_v4(), bogus, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = handler.update_status(Uuid::new_v4(), finish(), &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_removes_request() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);
        let pickup = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();

        // Admins may create but not delete
        let err = handler.delete(pickup.id, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        handler.delete(pickup.id, &fixture.head_jkt).await.unwrap();
        assert!(handler.projection.get(pickup.id).await.is_none());

        let err = handler.delete(pickup.id, &fixture.head_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_pending_is_branch_scoped() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);

        handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();
        let done = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();
        handler.update_status(done.id, finish(), &fixture.admin_jkt).await.unwrap();
        handler.create(fixture.pickup_request(), &fixture.admin_sby).await.unwrap();

        let own = handler.list_pending(Some(fixture.surabaya.id), &fixture.admin_jkt).await.unwrap();
        assert_eq!(own.len(), 1);
        assert!(own.iter().all(|p| p.owning_branch_id == fixture.jakarta.id));

        let all = handler.list_pending(None, &fixture.director).await.unwrap();
        assert_eq!(all.len(), 2);

        let narrowed = handler.list_pending(Some(fixture.surabaya.id), &fixture.director).await.unwrap();
        assert_eq!(narrowed.len(), 1);
    }

    #[tokio::test]
    async fn test_other_branch_cannot_touch_request() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture);
        let pickup = handler.create(fixture.pickup_request(), &fixture.admin_jkt).await.unwrap();

        let err = handler.update_status(pickup.id, finish(), &fixture.admin_sby).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
