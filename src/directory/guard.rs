use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthorizationGate, Operation, Session};
use crate::domain::consignment::ConsignmentProjection;
use crate::error::DomainError;
use crate::metrics::Metrics;
use super::{require_customer, Directory};

/// Refuses to delete a customer any consignment still names as sender or
/// recipient. Nothing cascades.
pub struct CustomerDeletionGuard {
    directory: Arc<dyn Directory>,
    consignments: Arc<ConsignmentProjection>,
    gate: AuthorizationGate,
    metrics: Arc<Metrics>,
}

impl CustomerDeletionGuard {
    pub fn new(
        directory: Arc<dyn Directory>,
        consignments: Arc<ConsignmentProjection>,
        gate: AuthorizationGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            directory,
            consignments,
            gate,
            metrics,
        }
    }

    pub async fn delete_customer(&self, customer_id: Uuid, session: &Session) -> Result<(), DomainError> {
        self.metrics
            .instrument("delete_customer", async {
                self.gate.authorize(session, Operation::DeleteCustomer)?;
                let customer = require_customer(self.directory.as_ref(), customer_id, "id").await?;

                if self.consignments.references_customer(customer_id).await {
                    tracing::warn!(
                        customer_id = %customer_id,
                        user_id = %session.user_id,
                        "Refused to delete customer still referenced by consignments"
                    );
                    return Err(DomainError::Conflict(format!(
                        "Customer {} is referenced by existing consignments",
                        customer.name
                    )));
                }

                if !self.directory.remove_customer(customer_id).await? {
                    return Err(DomainError::not_found("customer", "id", customer_id));
                }

                tracing::info!(customer_id = %customer_id, user_id = %session.user_id, "Customer deleted");
                Ok(())
            })
            .await
    }
}
