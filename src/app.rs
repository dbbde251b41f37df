use std::sync::Arc;

use crate::auth::{AuthorizationGate, SessionStore};
use crate::directory::{CustomerDeletionGuard, Directory};
use crate::domain::consignment::ConsignmentRegistry;
use crate::domain::pickup::PickupIntake;
use crate::domain::queue::QueueAssignmentService;
use crate::metrics::Metrics;
use crate::pagination::DEFAULT_LIMIT;

// ============================================================================
// Application State - one instance of every component, wired together
// ============================================================================

pub struct AppState {
    pub consignments: Arc<ConsignmentRegistry>,
    pub pickups: PickupIntake,
    pub queue: QueueAssignmentService,
    pub customers: CustomerDeletionGuard,
    pub sessions: Arc<SessionStore>,
    pub metrics: Arc<Metrics>,
    pub default_limit: u32,
}

impl AppState {
    pub fn new(directory: Arc<dyn Directory>, sessions: Arc<SessionStore>, metrics: Arc<Metrics>) -> Self {
        let gate = AuthorizationGate::new(metrics.clone());

        let consignments = Arc::new(ConsignmentRegistry::new(
            directory.clone(),
            gate.clone(),
            metrics.clone(),
        ));
        let pickups = PickupIntake::new(directory.clone(), gate.clone(), metrics.clone());
        let queue = QueueAssignmentService::new(
            consignments.clone(),
            directory.clone(),
            gate.clone(),
            metrics.clone(),
        );
        let customers = CustomerDeletionGuard::new(
            directory,
            consignments.projection(),
            gate,
            metrics.clone(),
        );

        Self {
            consignments,
            pickups,
            queue,
            customers,
            sessions,
            metrics,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }
}
