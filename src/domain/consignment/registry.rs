use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Session};
use crate::directory::Directory;
use crate::error::DomainError;
use crate::event_sourcing::store::EventStore;
use crate::metrics::Metrics;
use crate::pagination::{Page, PageRequest};

use super::aggregate::ConsignmentNote;
use super::command_handler::ConsignmentCommandHandler;
use super::numbering::NumberRegistry;
use super::projection::{ConsignmentFilter, ConsignmentProjection};
use super::queries::{ConsignmentQueries, ConsignmentRecord, TrackingSummary};
use super::requests::{CreateConsignmentRequest, UpdateConsignmentRequest, UpdateStatusRequest};

// ============================================================================
// Consignment Registry - owns the consignment note end to end
// ============================================================================

pub struct ConsignmentRegistry {
    commands: ConsignmentCommandHandler,
    queries: ConsignmentQueries,
    projection: Arc<ConsignmentProjection>,
    metrics: Arc<Metrics>,
}

impl ConsignmentRegistry {
    pub fn new(directory: Arc<dyn Directory>, gate: AuthorizationGate, metrics: Arc<Metrics>) -> Self {
        let event_store = Arc::new(EventStore::new("ConsignmentNote"));
        let projection = Arc::new(ConsignmentProjection::new());
        let numbers = Arc::new(NumberRegistry::new());

        let commands = ConsignmentCommandHandler::new(
            event_store,
            projection.clone(),
            numbers.clone(),
            directory.clone(),
            gate.clone(),
            metrics.clone(),
        );
        let queries = ConsignmentQueries::new(projection.clone(), numbers, directory, gate);

        Self {
            commands,
            queries,
            projection,
            metrics,
        }
    }

    /// Read model shared with the queue and the customer deletion guard
    pub fn projection(&self) -> Arc<ConsignmentProjection> {
        self.projection.clone()
    }

    pub async fn create(
        &self,
        request: CreateConsignmentRequest,
        session: &Session,
    ) -> Result<ConsignmentRecord, DomainError> {
        self.metrics
            .instrument("create_consignment", async {
                let note = self.commands.create(request, session).await?;
                self.queries.join(note).await
            })
            .await
    }

    pub async fn update(
        &self,
        consignment_id: Uuid,
        request: UpdateConsignmentRequest,
        session: &Session,
    ) -> Result<ConsignmentRecord, DomainError> {
        self.metrics
            .instrument("update_consignment", async {
                let note = self.commands.update(consignment_id, request, session).await?;
                self.queries.join(note).await
            })
            .await
    }

    pub async fn update_status(
        &self,
        consignment_id: Uuid,
        request: UpdateStatusRequest,
        session: &Session,
    ) -> Result<ConsignmentRecord, DomainError> {
        self.metrics
            .instrument("update_consignment_status", async {
                let note = self.commands.update_status(consignment_id, request, session).await?;
                self.queries.join(note).await
            })
            .await
    }

    /// Loading step used by the queue; role and truck checks happen there
    pub async fn assign_truck(
        &self,
        consignment_id: Uuid,
        truck_id: Uuid,
        session: &Session,
    ) -> Result<(ConsignmentNote, Option<Uuid>), DomainError> {
        self.commands.assign_truck(consignment_id, truck_id, session).await
    }

    pub async fn list(
        &self,
        filter: ConsignmentFilter,
        page: PageRequest,
        session: &Session,
    ) -> Result<Page<ConsignmentRecord>, DomainError> {
        self.metrics
            .instrument("list_consignments", self.queries.list(filter, page, session))
            .await
    }

    pub async fn get(&self, consignment_id: Uuid, session: &Session) -> Result<ConsignmentRecord, DomainError> {
        self.metrics
            .instrument("get_consignment", self.queries.get(consignment_id, session))
            .await
    }

    pub async fn track_by_number(&self, number: &str) -> Result<TrackingSummary, DomainError> {
        self.metrics
            .instrument("track_consignment", self.queries.track(number))
            .await
    }

    pub async fn join(&self, note: ConsignmentNote) -> Result<ConsignmentRecord, DomainError> {
        self.queries.join(note).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consignment::value_objects::ConsignmentStatus;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;

    fn registry(fixture: &Fixture) -> ConsignmentRegistry {
        ConsignmentRegistry::new(
            fixture.directory.clone(),
            AuthorizationGate::new(fixture.metrics.clone()),
            fixture.metrics.clone(),
        )
    }

    #[tokio::test]
    async fn test_create_returns_joined_record() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);

        let record = registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        assert_eq!(record.origin_branch_name.as_deref(), Some("Jakarta"));
        assert_eq!(record.destination_branch_name.as_deref(), Some("Surabaya"));
        assert_eq!(record.sender_name.as_deref(), Some(fixture.sender.name.as_str()));
        assert_eq!(record.recipient_name.as_deref(), Some(fixture.recipient.name.as_str()));
        assert_eq!(record.created_by_name.as_deref(), Some("Admin Jakarta"));
        assert_eq!(record.forwarder_name, None);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_home_branch() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);

        registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        registry.create(fixture.create_request(), &fixture.admin_sby).await.unwrap();

        // Explicit filter for another branch is overridden
        let filter = ConsignmentFilter { branch_id: Some(fixture.jakarta.id), ..Default::default() };
        let page = registry.list(filter, PageRequest::default(), &fixture.admin_sby).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|r| r.note.owning_branch_id == fixture.surabaya.id));

        let page = registry
            .list(ConsignmentFilter::default(), PageRequest::default(), &fixture.director)
            .await
            .unwrap();
        assert_eq!(page.total, 3);

        let filter = ConsignmentFilter { branch_id: Some(fixture.jakarta.id), ..Default::default() };
        let page = registry.list(filter, PageRequest::default(), &fixture.director).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_list_total_is_independent_of_paging() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);
        for _ in 0..5 {
            registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        }

        let page = registry
            .list(ConsignmentFilter::default(), PageRequest { page: 2, limit: 2 }, &fixture.admin_jkt)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert!(page.links().next.is_some());
        assert!(page.links().prev.is_some());
    }

    #[tokio::test]
    async fn test_get_respects_branch_visibility() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);
        let record = registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();
        let id = record.note.id;

        assert!(registry.get(id, &fixture.admin_sby).await.is_ok());
        assert_eq!(registry.get(id, &fixture.admin_mdn).await.unwrap_err().kind(), ErrorKind::Forbidden);
        assert_eq!(registry.get(Uuid::new_v4(), &fixture.director).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_tracking_hides_pricing_and_ownership() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);
        let record = registry.create(fixture.create_request(), &fixture.admin_jkt).await.unwrap();

        let summary = registry.track_by_number(record.note.number.as_str()).await.unwrap();
        assert_eq!(summary.status, ConsignmentStatus::Pending);

        let json = serde_json::to_value(&summary).unwrap();
        for hidden in ["price", "pricing", "rate_per_kg", "created_by", "owning_branch_id"] {
            assert!(json.get(hidden).is_none(), "{} leaked", hidden);
        }

        let err = registry.track_by_number("NOPE00000000").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failures_are_counted_by_kind() {
        let fixture = Fixture::new().await;
        let registry = registry(&fixture);

        let _ = registry.create(fixture.create_request(), &fixture.finance_jkt).await;
        assert_eq!(fixture.metrics.domain_errors.with_label_values(&["forbidden"]).get(), 1);
    }
}
