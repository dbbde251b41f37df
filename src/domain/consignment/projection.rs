use std::collections::HashMap;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::aggregate::ConsignmentNote;
use super::value_objects::{ConsignmentStatus, PaymentMethod};

// ============================================================================
// Consignment Read Model
// ============================================================================
//
// Latest snapshot per consignment, fed by the command handler after each
// successful append. A snapshot only replaces the stored one when its
// version is newer, so a slow writer can never roll the view back.
//
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsignmentFilter {
    /// Owning branch
    pub branch_id: Option<Uuid>,
    pub origin_branch_id: Option<Uuid>,
    pub destination_branch_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub status: Option<ConsignmentStatus>,
    pub payment_method: Option<PaymentMethod>,
    /// Case-insensitive substring of the consignment number
    pub number: Option<String>,
    /// Creation date range, both ends inclusive
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ConsignmentFilter {
    pub fn matches(&self, note: &ConsignmentNote) -> bool {
        fn eq<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        let created_on = note.created_at.date_naive();

        eq(&self.branch_id, &note.owning_branch_id)
            && eq(&self.origin_branch_id, &note.origin_branch_id)
            && eq(&self.destination_branch_id, &note.destination_branch_id)
            && eq(&self.sender_id, &note.sender_id)
            && eq(&self.recipient_id, &note.recipient_id)
            && eq(&self.status, &note.status)
            && eq(&self.payment_method, &note.payment_method)
            && self.number.as_deref().map_or(true, |n| {
                note.number
                    .as_str()
                    .to_ascii_lowercase()
                    .contains(&n.trim().to_ascii_lowercase())
            })
            && self.start.map_or(true, |start| created_on >= start)
            && self.end.map_or(true, |end| created_on <= end)
    }
}

#[derive(Default)]
pub struct ConsignmentProjection {
    notes: RwLock<HashMap<Uuid, ConsignmentNote>>,
}

impl ConsignmentProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `note` unless an equal or newer version is already present.
    /// Returns whether the view changed.
    pub async fn upsert(&self, note: ConsignmentNote) -> bool {
        let mut notes = self.notes.write().await;
        match notes.get(&note.id) {
            Some(existing) if existing.version >= note.version => {
                tracing::debug!(
                    consignment_id = %note.id,
                    stored = existing.version,
                    incoming = note.version,
                    "Skipping stale consignment snapshot"
                );
                false
            }
            _ => {
                notes.insert(note.id, note);
                true
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<ConsignmentNote> {
        self.notes.read().await.get(&id).cloned()
    }

    /// Matching notes, newest first
    pub async fn query(&self, filter: &ConsignmentFilter) -> Vec<ConsignmentNote> {
        let notes = self.notes.read().await;
        let mut matched: Vec<ConsignmentNote> =
            notes.values().filter(|n| filter.matches(n)).cloned().collect();

        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.number.as_str().cmp(a.number.as_str()))
        });
        matched
    }

    /// Whether any consignment names the customer as sender or recipient
    pub async fn references_customer(&self, customer_id: Uuid) -> bool {
        self.notes
            .read()
            .await
            .values()
            .any(|n| n.sender_id == customer_id || n.recipient_id == customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_note;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_upsert_ignores_stale_versions() {
        let projection = ConsignmentProjection::new();
        let mut note = sample_note();
        note.version = 3;
        note.status = ConsignmentStatus::Transit;
        assert!(projection.upsert(note.clone()).await);

        let mut stale = note.clone();
        stale.version = 2;
        stale.status = ConsignmentStatus::Loaded;
        assert!(!projection.upsert(stale).await);

        assert_eq!(projection.get(note.id).await.unwrap().status, ConsignmentStatus::Transit);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders_newest_first() {
        let projection = ConsignmentProjection::new();

        let mut older = sample_note();
        older.created_at = Utc::now() - Duration::days(2);
        let mut newer = sample_note();
        newer.owning_branch_id = older.owning_branch_id;
        newer.status = ConsignmentStatus::Loaded;
        let other_branch = sample_note();

        for note in [older.clone(), newer.clone(), other_branch] {
            projection.upsert(note).await;
        }

        let filter = ConsignmentFilter { branch_id: Some(older.owning_branch_id), ..Default::default() };
        let ids: Vec<Uuid> = projection.query(&filter).await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let filter = ConsignmentFilter {
            branch_id: Some(older.owning_branch_id),
            status: Some(ConsignmentStatus::Loaded),
            ..Default::default()
        };
        assert_eq!(projection.query(&filter).await.len(), 1);

        let today = Utc::now().date_naive();
        let filter = ConsignmentFilter { start: Some(today), end: Some(today), ..Default::default() };
        assert!(projection.query(&filter).await.iter().all(|n| n.id != older.id));
    }

    #[tokio::test]
    async fn test_number_filter_is_case_insensitive_substring() {
        let projection = ConsignmentProjection::new();
        let note = sample_note();
        projection.upsert(note.clone()).await;

        let needle = note.number.as_str()[1..6].to_ascii_lowercase();
        let filter = ConsignmentFilter { number: Some(needle), ..Default::default() };
        assert_eq!(projection.query(&filter).await.len(), 1);

        let filter = ConsignmentFilter { number: Some("ZZZ".to_string()), ..Default::default() };
        assert!(projection.query(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn test_references_customer() {
        let projection = ConsignmentProjection::new();
        let note = sample_note();
        projection.upsert(note.clone()).await;

        assert!(projection.references_customer(note.sender_id).await);
        assert!(projection.references_customer(note.recipient_id).await);
        assert!(!projection.references_customer(Uuid::new_v4()).await);
    }
}
