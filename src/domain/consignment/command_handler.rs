use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Operation, Session};
use crate::directory::{require_branch, require_customer, require_forwarder, Directory};
use crate::error::DomainError;
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::{EventStore, StoreError};
use crate::metrics::Metrics;

use super::aggregate::ConsignmentNote;
use super::commands::{ConsignmentCommand, ConsignmentPatch, RegisterConsignment};
use super::events::ConsignmentEvent;
use super::numbering::NumberRegistry;
use super::projection::ConsignmentProjection;
use super::requests::{CreateConsignmentRequest, UpdateConsignmentRequest, UpdateStatusRequest};
use super::value_objects::ConsignmentNumber;

// ============================================================================
// Consignment Command Handler
// ============================================================================
//
// Orchestrates: Gate → Input → References → Aggregate → Events → Event Store
//               → Read Model
//
// Every write runs as a conditional append on the version the aggregate was
// loaded at; a concurrent writer that got there first turns this one into
// a CONFLICT and nothing is written.
//
// ============================================================================

pub struct ConsignmentCommandHandler {
    event_store: Arc<EventStore<ConsignmentEvent>>,
    projection: Arc<ConsignmentProjection>,
    numbers: Arc<NumberRegistry>,
    directory: Arc<dyn Directory>,
    gate: AuthorizationGate,
    metrics: Arc<Metrics>,
}

impl ConsignmentCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<ConsignmentEvent>>,
        projection: Arc<ConsignmentProjection>,
        numbers: Arc<NumberRegistry>,
        directory: Arc<dyn Directory>,
        gate: AuthorizationGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            projection,
            numbers,
            directory,
            gate,
            metrics,
        }
    }

    pub async fn create(
        &self,
        request: CreateConsignmentRequest,
        session: &Session,
    ) -> Result<ConsignmentNote, DomainError> {
        self.gate.authorize(session, Operation::CreateConsignment)?;
        let draft = request.into_draft()?;

        let directory = self.directory.as_ref();
        let origin = require_branch(directory, draft.origin_branch_id, "origin_branch_id").await?;
        require_branch(directory, draft.destination_branch_id, "destination_branch_id").await?;
        require_customer(directory, draft.sender_id, "sender_id").await?;
        require_customer(directory, draft.recipient_id, "recipient_id").await?;
        if let Some(forwarder_id) = draft.forwarding.forwarder_id {
            require_forwarder(directory, forwarder_id, "forwarder_id").await?;
        }

        let command = RegisterConsignment {
            consignment_id: Uuid::new_v4(),
            origin_branch_id: draft.origin_branch_id,
            destination_branch_id: draft.destination_branch_id,
            sender_id: draft.sender_id,
            recipient_id: draft.recipient_id,
            cargo: draft.cargo,
            rate_per_kg: draft.rate_per_kg,
            price: draft.price,
            payment_method: draft.payment_method,
            forwarding: draft.forwarding,
            created_by: session.user_id,
            owning_branch_id: session.branch_id,
        };
        ConsignmentNote::check_registration(&command)?;

        let prefix = ConsignmentNumber::prefix(&origin.code, Utc::now().date_naive());
        let number = self.numbers.issue(&prefix, command.consignment_id).await?;

        // Number and stream are one unit: a failed append gives the number back
        let note = match self.open_stream(&command, number.clone(), session).await {
            Ok(note) => note,
            Err(error) => {
                self.numbers.release(&number).await;
                return Err(error);
            }
        };

        self.metrics.consignments_created.inc();
        tracing::info!(
            consignment_id = %note.id,
            number = %note.number,
            owning_branch_id = %note.owning_branch_id,
            created_by = %note.created_by,
            price = %note.pricing.price,
            "Consignment created"
        );

        Ok(note)
    }

    pub async fn update(
        &self,
        consignment_id: Uuid,
        request: UpdateConsignmentRequest,
        session: &Session,
    ) -> Result<ConsignmentNote, DomainError> {
        self.gate.authorize(session, Operation::UpdateConsignment)?;
        let patch = request.into_patch()?;

        let note = self.load(consignment_id).await?;
        self.gate
            .ensure_branch_access(session, Operation::UpdateConsignment, &note.involved_branches())?;
        self.resolve_patch_references(&patch).await?;

        let version = note.version;
        let note = self
            .execute(note, ConsignmentCommand::Update { patch }, session)
            .await?;

        if note.version > version {
            tracing::info!(consignment_id = %note.id, version = note.version, "Consignment updated");
        }
        Ok(note)
    }

    /// Any member of the status set is accepted from any status; off-path
    /// moves are logged at warn level for audit.
    pub async fn update_status(
        &self,
        consignment_id: Uuid,
        request: UpdateStatusRequest,
        session: &Session,
    ) -> Result<ConsignmentNote, DomainError> {
        self.gate.authorize(session, Operation::UpdateConsignmentStatus)?;
        let status = request.parse()?;

        let note = self.load(consignment_id).await?;
        self.gate.ensure_branch_access(
            session,
            Operation::UpdateConsignmentStatus,
            &note.involved_branches(),
        )?;

        let from = note.status;
        let note = self
            .execute(note, ConsignmentCommand::ChangeStatus { status }, session)
            .await?;

        if note.status != from {
            self.metrics.record_status_transition(from.as_str(), note.status.as_str());
            if from.is_standard_transition(note.status) {
                tracing::info!(
                    consignment_id = %note.id,
                    number = %note.number,
                    from = %from,
                    to = %note.status,
                    user_id = %session.user_id,
                    "Consignment status changed"
                );
            } else {
                tracing::warn!(
                    consignment_id = %note.id,
                    number = %note.number,
                    from = %from,
                    to = %note.status,
                    user_id = %session.user_id,
                    "Consignment status changed outside the standard path"
                );
            }
        }

        Ok(note)
    }

    /// Put the consignment on `truck_id`. Role and truck checks belong to the
    /// queue service; this only enforces branch visibility and the aggregate rules.
    ///
    /// Returns the loaded note together with the truck it was on before, read
    /// from the same version the append was conditioned on.
    pub async fn assign_truck(
        &self,
        consignment_id: Uuid,
        truck_id: Uuid,
        session: &Session,
    ) -> Result<(ConsignmentNote, Option<Uuid>), DomainError> {
        let note = self.load(consignment_id).await?;
        self.gate
            .ensure_branch_access(session, Operation::AssignTruck, &note.involved_branches())?;

        let from = note.status;
        let previous_truck_id = note.truck_id;
        let note = self
            .execute(note, ConsignmentCommand::AssignTruck { truck_id }, session)
            .await?;

        self.metrics.truck_assignments.inc();
        if from != note.status {
            self.metrics.record_status_transition(from.as_str(), note.status.as_str());
        }

        Ok((note, previous_truck_id))
    }

    async fn load(&self, consignment_id: Uuid) -> Result<ConsignmentNote, DomainError> {
        match self.event_store.load_aggregate::<ConsignmentNote>(consignment_id).await {
            Ok(note) => Ok(note),
            Err(StoreError::AggregateNotFound(_)) => {
                Err(DomainError::not_found("consignment", "id", consignment_id))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn resolve_patch_references(&self, patch: &ConsignmentPatch) -> Result<(), DomainError> {
        let directory = self.directory.as_ref();
        if let Some(id) = patch.origin_branch_id {
            require_branch(directory, id, "origin_branch_id").await?;
        }
        if let Some(id) = patch.destination_branch_id {
            require_branch(directory, id, "destination_branch_id").await?;
        }
        if let Some(id) = patch.sender_id {
            require_customer(directory, id, "sender_id").await?;
        }
        if let Some(id) = patch.recipient_id {
            require_customer(directory, id, "recipient_id").await?;
        }
        if let Some(id) = patch.forwarding.and_then(|f| f.forwarder_id) {
            require_forwarder(directory, id, "forwarder_id").await?;
        }
        Ok(())
    }

    async fn open_stream(
        &self,
        command: &RegisterConsignment,
        number: ConsignmentNumber,
        session: &Session,
    ) -> Result<ConsignmentNote, DomainError> {
        let event = ConsignmentNote::register(command, number)?;
        let mut note = ConsignmentNote::apply_first_event(&event)?;

        let correlation_id = Uuid::now_v7();
        let envelope = Self::envelope(note.id, 1, event, correlation_id, session);
        let version = self.event_store.append_events(note.id, 0, vec![envelope]).await?;

        note.set_version(version);
        self.projection.upsert(note.clone()).await;
        Ok(note)
    }

    /// Handle a command against loaded state and persist the resulting events
    async fn execute(
        &self,
        note: ConsignmentNote,
        command: ConsignmentCommand,
        session: &Session,
    ) -> Result<ConsignmentNote, DomainError> {
        let expected_version = note.version();
        let events = note.handle_command(&command)?;

        if events.is_empty() {
            tracing::debug!(consignment_id = %note.id, command = command.name(), "Command produced no change");
            return Ok(note);
        }

        let correlation_id = Uuid::now_v7();
        let mut note = note;
        let mut envelopes = Vec::with_capacity(events.len());
        let mut seq = expected_version;

        for event in events {
            seq += 1;
            note.apply_event(&event)?;
            envelopes.push(Self::envelope(note.id, seq, event, correlation_id, session));
        }

        let new_version = self
            .event_store
            .append_events(note.id, expected_version, envelopes)
            .await?;

        note.set_version(new_version);
        self.projection.upsert(note.clone()).await;
        Ok(note)
    }

    fn envelope(
        aggregate_id: Uuid,
        sequence_number: i64,
        event: ConsignmentEvent,
        correlation_id: Uuid,
        session: &Session,
    ) -> EventEnvelope<ConsignmentEvent> {
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
    use crate::domain::consignment::value_objects::ConsignmentStatus;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;
    use rust_decimal::Decimal;

    async fn handler(fixture: &Fixture) -> ConsignmentCommandHandler {
        ConsignmentCommandHandler::new(
            Arc::new(EventStore::new("ConsignmentNote")),
            Arc::new(ConsignmentProjection::new()),
            Arc::new(NumberRegistry::new()),
            fixture.directory.clone(),
            AuthorizationGate::new(fixture.metrics.clone()),
            fixture.metrics.clone(),
        )
    }

    #[tokio::test]
    async fn test_create_derives_price_and_takes_ownership_from_session() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;

        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        assert_eq!(note.pricing.price, Decimal::new(37500, 0));
        assert_eq!(note.status, ConsignmentStatus::Pending);
        assert_eq!(note.created_by, fixture.admin_jkt.user_id);
        assert_eq!(note.owning_branch_id, fixture.admin_jkt.branch_id);
        assert!(note.number.as_str().starts_with("JKT"));
        assert_eq!(note.barcode, note.number.barcode());
        assert_eq!(note.version, 1);
        assert!(handler.projection.get(note.id).await.is_some());
        assert_eq!(fixture.metrics.consignments_created.get(), 1);
    }

    #[tokio::test]
    async fn test_create_with_missing_origin_persists_nothing() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;

        let mut request = fixture.create_request();
        request.origin_branch_id = Some(Uuid::new_v4());

        let err = handler.create(request, &fixture.admin_jkt).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "branch", field: "origin_branch_id", .. }));
        assert!(handler.projection.query(&Default::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_recipient_and_forwarder() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;

        let mut request = fixture.create_request();
        request.recipient_id = Some(Uuid::new_v4());
        let err = handler.create(request, &fixture.admin_jkt).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { field: "recipient_id", .. }));

        let mut request = fixture.create_request();
        request.forwarder_code = crate::domain::consignment::ForwarderCode::Forwarded;
        request.forwarder_id = Some(Uuid::new_v4());
        let err = handler.create(request, &fixture.admin_jkt).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "forwarder", .. }));
    }

    #[tokio::test]
    async fn test_create_with_unpriceable_cargo_spends_no_number() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let huge = Decimal::from_i128_with_scale(10i128.pow(20), 0);

        let mut request = fixture.create_request();
        request.weight_kg = Some(huge);
        request.rate_per_kg = Some(huge);
        request.price = None;

        let err = handler.create(request, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.field_errors().unwrap().contains_key("price"));
        assert!(handler.projection.query(&Default::default()).await.is_empty());

        // The sequence was never touched
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        assert!(note.number.as_str().ends_with("00001"));
    }

    #[tokio::test]
    async fn test_update_with_unpriceable_cargo_is_validation() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        let huge = Decimal::from_i128_with_scale(10i128.pow(20), 0);

        let request = UpdateConsignmentRequest {
            rate_per_kg: Some(huge),
            weight_kg: Some(huge),
            ..Default::default()
        };
        let err = handler.update(note.id, request, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(handler.projection.get(note.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_create_forbidden_for_courier() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;

        let err = handler.create(fixture.create_request(), &fixture.courier_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_numbers() {
        let fixture = Fixture::new().await;
        let handler = Arc::new(handler(&fixture).await);

        let creates = (0..20).map(|_| {
            let handler = handler.clone();
            let request = fixture.create_request();
            let session = fixture.admin_jkt.clone();
            async move { handler.create(request, &session).await }
        });

        let notes = futures_util::future::join_all(creates).await;
        let mut numbers: Vec<String> = notes
            .into_iter()
            .map(|n| n.unwrap().number.as_str().to_string())
            .collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 20);
    }

    #[tokio::test]
    async fn test_update_recomputes_price_from_rate_and_weight() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        let request = UpdateConsignmentRequest {
            rate_per_kg: Some(Decimal::new(20000, 0)),
            weight_kg: Some(Decimal::new(3, 0)),
            price: Some(Decimal::new(5, 0)),
            ..Default::default()
        };
        let updated = handler.update(note.id, request, &fixture.admin_jkt).await.unwrap();

        assert_eq!(updated.pricing.price, Decimal::new(60000, 0));
        assert_eq!(updated.version, 2);
        assert_eq!(updated.number, note.number);
    }

    #[tokio::test]
    async fn test_update_revalidates_references() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        let request = UpdateConsignmentRequest { sender_id: Some(Uuid::new_v4()), ..Default::default() };
        let err = handler.update(note.id, request, &fixture.admin_jkt).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { field: "sender_id", .. }));

        let err = handler
            .update(Uuid::new_v4(), UpdateConsignmentRequest::default(), &fixture.admin_jkt)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "consignment", .. }));
    }

    #[tokio::test]
    async fn test_update_from_unrelated_branch_is_forbidden() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        let request = UpdateConsignmentRequest { item_name: Some("Ban".to_string()), ..Default::default() };
        let err = handler.update(note.id, request, &fixture.admin_mdn).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // Destination branch staff may touch it
        let request = UpdateConsignmentRequest { item_name: Some("Ban".to_string()), ..Default::default() };
        assert!(handler.update(note.id, request, &fixture.admin_sby).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_status_is_permissive_and_audited() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        let request = UpdateStatusRequest { status: Some("TERKIRIM".to_string()) };
        let updated = handler.update_status(note.id, request, &fixture.courier_jkt).await.unwrap();
        assert_eq!(updated.status, ConsignmentStatus::Delivered);

        let history = handler.event_store.load_events(note.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.event_type, "ConsignmentStatusChanged");
        assert_eq!(last.user_id, Some(fixture.courier_jkt.user_id));
        assert_eq!(
            fixture
                .metrics
                .status_transitions
                .with_label_values(&["PENDING", "TERKIRIM"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_status_validates_before_lookup() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;

        let request = UpdateStatusRequest { status: Some("LOST".to_string()) };
        let err = handler.update_status(Uuid::new_v4(), request, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let request = UpdateStatusRequest { status: Some("MUAT".to_string()) };
        let err = handler.update_status(Uuid::new_v4(), request, &fixture.admin_jkt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_stale_writer_gets_conflict() {
        let fixture = Fixture::new().await;
        let handler = handler(&fixture).await;
        let note = handler.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        // Two writers loaded version 1; the second append must fail
        let stale = handler.load(note.id).await.unwrap();
        handler
            .update_status(note.id, UpdateStatusRequest { status: Some("MUAT".to_string()) }, &fixture.admin_jkt)
            .await
            .unwrap();

        let err = handler
            .execute(stale, ConsignmentCommand::ChangeStatus { status: ConsignmentStatus::Returned }, &fixture.admin_jkt)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(handler.projection.get(note.id).await.unwrap().status, ConsignmentStatus::Loaded);
    }
}
