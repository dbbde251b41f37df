use std::sync::Arc;
use uuid::Uuid;

use crate::error::DomainError;
use crate::metrics::Metrics;
use super::session::{Role, Session};

// ============================================================================
// Authorization Gate
// ============================================================================
//
// Evaluated per request from the session's role and home branch. Holds no
// request state; the permission table below is the single source of truth
// for which role may run which operation.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadConsignments,
    CreateConsignment,
    UpdateConsignment,
    UpdateConsignmentStatus,
    ReadPickups,
    CreatePickup,
    UpdatePickup,
    UpdatePickupStatus,
    DeletePickup,
    ReadQueue,
    AssignTruck,
    DeleteCustomer,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadConsignments => "read_consignments",
            Operation::CreateConsignment => "create_consignment",
            Operation::UpdateConsignment => "update_consignment",
            Operation::UpdateConsignmentStatus => "update_consignment_status",
            Operation::ReadPickups => "read_pickups",
            Operation::CreatePickup => "create_pickup",
            Operation::UpdatePickup => "update_pickup",
            Operation::UpdatePickupStatus => "update_pickup_status",
            Operation::DeletePickup => "delete_pickup",
            Operation::ReadQueue => "read_queue",
            Operation::AssignTruck => "assign_truck",
            Operation::DeleteCustomer => "delete_customer",
        }
    }
}

use Role::*;

const EVERYONE: &[Role] = &[Director, OperationsManager, BranchHead, Admin, Checker, Courier, Finance];
const OFFICE: &[Role] = &[Director, OperationsManager, BranchHead, Admin];
const CENTRAL: &[Role] = &[Director, OperationsManager];

/// Operation -> roles allowed to run it
const PERMISSIONS: &[(Operation, &[Role])] = &[
    (Operation::ReadConsignments, EVERYONE),
    (Operation::CreateConsignment, OFFICE),
    (Operation::UpdateConsignment, OFFICE),
    (Operation::UpdateConsignmentStatus, &[Director, OperationsManager, BranchHead, Admin, Checker, Courier]),
    (Operation::ReadPickups, EVERYONE),
    (Operation::CreatePickup, OFFICE),
    (Operation::UpdatePickup, OFFICE),
    (Operation::UpdatePickupStatus, &[Director, OperationsManager, BranchHead, Admin, Courier]),
    (Operation::DeletePickup, &[Director, OperationsManager, BranchHead]),
    (Operation::ReadQueue, &[Director, OperationsManager, BranchHead, Checker]),
    (Operation::AssignTruck, &[Director, OperationsManager, BranchHead, Checker]),
    (Operation::DeleteCustomer, CENTRAL),
];

pub fn allowed_roles(operation: Operation) -> &'static [Role] {
    PERMISSIONS
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

#[derive(Clone)]
pub struct AuthorizationGate {
    metrics: Arc<Metrics>,
}

impl AuthorizationGate {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Reject roles outside the operation's allow-list
    pub fn authorize(&self, session: &Session, operation: Operation) -> Result<(), DomainError> {
        if allowed_roles(operation).contains(&session.role) {
            return Ok(());
        }

        self.deny(
            session,
            operation,
            format!("Role {} may not {}", session.role.as_str(), operation.as_str()),
        )
    }

    /// Effective branch filter for a list query. `None` means every branch.
    /// Non-privileged callers are pinned to their home branch whatever they ask for.
    pub fn scope_branch(&self, session: &Session, requested: Option<Uuid>) -> Option<Uuid> {
        if session.role.is_privileged() {
            requested
        } else {
            if requested.is_some_and(|b| b != session.branch_id) {
                tracing::debug!(
                    user_id = %session.user_id,
                    home_branch = %session.branch_id,
                    "Overriding caller branch filter with home branch"
                );
            }
            Some(session.branch_id)
        }
    }

    /// Require the caller's home branch to be one of `branches`
    /// (owning, origin or destination of the record being touched).
    pub fn ensure_branch_access(
        &self,
        session: &Session,
        operation: Operation,
        branches: &[Uuid],
    ) -> Result<(), DomainError> {
        if session.role.is_privileged() || branches.contains(&session.branch_id) {
            return Ok(());
        }

        self.deny(
            session,
            operation,
            "Record belongs to another branch".to_string(),
        )
    }

    fn deny(&self, session: &Session, operation: Operation, reason: String) -> Result<(), DomainError> {
        tracing::warn!(
            user_id = %session.user_id,
            role = session.role.as_str(),
            branch_id = %session.branch_id,
            operation = operation.as_str(),
            "Authorization denied: {}",
            reason
        );
        self.metrics.record_denied(operation.as_str());
        Err(DomainError::Forbidden(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(Metrics::new().unwrap()))
    }

    fn session(role: Role, branch: Uuid) -> Session {
        Session::new(Uuid::new_v4(), "user", role, branch)
    }

    #[test]
    fn test_every_operation_has_an_allow_list() {
        let all = [
            Operation::ReadConsignments,
            Operation::CreateConsignment,
            Operation::UpdateConsignment,
            Operation::UpdateConsignmentStatus,
            Operation::ReadPickups,
            Operation::CreatePickup,
            Operation::UpdatePickup,
            Operation::UpdatePickupStatus,
            Operation::DeletePickup,
            Operation::ReadQueue,
            Operation::AssignTruck,
            Operation::DeleteCustomer,
        ];
        for op in all {
            assert!(!allowed_roles(op).is_empty(), "{} has no roles", op.as_str());
        }
    }

    #[test]
    fn test_deletion_list_is_narrower_than_creation() {
        let create = allowed_roles(Operation::CreatePickup);
        let delete = allowed_roles(Operation::DeletePickup);
        assert!(delete.len() < create.len());
        assert!(delete.iter().all(|r| create.contains(r)));
    }

    #[test]
    fn test_authorize_rejects_role_outside_list() {
        let gate = gate();
        let branch = Uuid::new_v4();

        assert!(gate.authorize(&session(Role::Admin, branch), Operation::CreateConsignment).is_ok());

        let err = gate
            .authorize(&session(Role::Courier, branch), Operation::CreateConsignment)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_scope_branch_pins_non_privileged_users() {
        let gate = gate();
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();

        let admin = session(Role::Admin, home);
        assert_eq!(gate.scope_branch(&admin, Some(other)), Some(home));
        assert_eq!(gate.scope_branch(&admin, None), Some(home));

        let director = session(Role::Director, home);
        assert_eq!(gate.scope_branch(&director, Some(other)), Some(other));
        assert_eq!(gate.scope_branch(&director, None), None);
    }

    #[test]
    fn test_branch_access() {
        let gate = gate();
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();

        let checker = session(Role::Checker, home);
        assert!(gate.ensure_branch_access(&checker, Operation::AssignTruck, &[other, home]).is_ok());
        assert!(gate.ensure_branch_access(&checker, Operation::AssignTruck, &[other]).is_err());

        let manager = session(Role::OperationsManager, home);
        assert!(gate.ensure_branch_access(&manager, Operation::AssignTruck, &[other]).is_ok());
    }
}
