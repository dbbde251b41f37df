use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::aggregate::PickupRequest;
use super::value_objects::PickupStatus;

// ============================================================================
// Pickup Read Model
// ============================================================================

#[derive(Default)]
pub struct PickupProjection {
    requests: RwLock<HashMap<Uuid, PickupRequest>>,
}

impl PickupProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newer snapshots replace older ones. Deleted requests stay as
    /// tombstones so a late snapshot cannot bring them back.
    pub async fn upsert(&self, pickup: PickupRequest) -> bool {
        let mut requests = self.requests.write().await;
        if requests.get(&pickup.id).is_some_and(|existing| existing.version >= pickup.version) {
            return false;
        }
        requests.insert(pickup.id, pickup);
        true
    }

    pub async fn get(&self, id: Uuid) -> Option<PickupRequest> {
        self.requests
            .read()
            .await
            .get(&id)
            .filter(|p| !p.deleted)
            .cloned()
    }

    /// Pending requests, oldest requested date first. `None` means every branch.
    pub async fn pending(&self, branch_id: Option<Uuid>) -> Vec<PickupRequest> {
        let requests = self.requests.read().await;
        let mut pending: Vec<PickupRequest> = requests
            .values()
            .filter(|p| !p.deleted && p.status == PickupStatus::Pending)
            .filter(|p| branch_id.map_or(true, |b| p.owning_branch_id == b))
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.created_at.cmp(&b.created_at)));
        pending
    }
}
