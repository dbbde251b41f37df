use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DomainError;
use super::{Branch, Customer, Directory, Forwarder, Truck, User};

#[derive(Default)]
struct Tables {
    branches: HashMap<Uuid, Branch>,
    customers: HashMap<Uuid, Customer>,
    forwarders: HashMap<Uuid, Forwarder>,
    trucks: HashMap<Uuid, Truck>,
    users: HashMap<Uuid, User>,
}

/// Authoritative in-process directory. Reads go straight to the tables, so a
/// removed record is gone for the very next lookup.
#[derive(Default)]
pub struct InMemoryDirectory {
    tables: RwLock<Tables>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_branch(&self, branch: Branch) {
        self.tables.write().await.branches.insert(branch.id, branch);
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.tables.write().await.customers.insert(customer.id, customer);
    }

    pub async fn add_forwarder(&self, forwarder: Forwarder) {
        self.tables.write().await.forwarders.insert(forwarder.id, forwarder);
    }

    pub async fn add_truck(&self, truck: Truck) {
        self.tables.write().await.trucks.insert(truck.id, truck);
    }

    pub async fn add_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn branch(&self, id: Uuid) -> Result<Option<Branch>, DomainError> {
        Ok(self.tables.read().await.branches.get(&id).cloned())
    }

    async fn customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn forwarder(&self, id: Uuid) -> Result<Option<Forwarder>, DomainError> {
        Ok(self.tables.read().await.forwarders.get(&id).cloned())
    }

    async fn truck(&self, id: Uuid) -> Result<Option<Truck>, DomainError> {
        Ok(self.tables.read().await.trucks.get(&id).cloned())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn remove_customer(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.tables.write().await.customers.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{require_branch, require_customer};
    use crate::error::{DomainError, ErrorKind};

    #[tokio::test]
    async fn test_lookup_and_missing_reference() {
        let directory = InMemoryDirectory::new();
        let branch = Branch { id: Uuid::new_v4(), code: "JKT".to_string(), name: "Jakarta".to_string() };
        directory.add_branch(branch.clone()).await;

        assert_eq!(require_branch(&directory, branch.id, "origin_branch_id").await.unwrap(), branch);

        let err = require_branch(&directory, Uuid::new_v4(), "destination_branch_id")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, DomainError::NotFound { field: "destination_branch_id", .. }));
    }

    #[tokio::test]
    async fn test_removed_customer_is_not_resolvable() {
        let directory = InMemoryDirectory::new();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "PT Sinar Jaya".to_string(),
            phone: None,
            address: None,
            branch_id: Uuid::new_v4(),
        };
        directory.add_customer(customer.clone()).await;

        assert!(directory.remove_customer(customer.id).await.unwrap());
        assert!(require_customer(&directory, customer.id, "sender_id").await.is_err());
        assert!(!directory.remove_customer(customer.id).await.unwrap());
    }
}
