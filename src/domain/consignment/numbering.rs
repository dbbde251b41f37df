use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::DomainError;
use super::value_objects::ConsignmentNumber;

// ============================================================================
// Consignment Number Registry
// ============================================================================
//
// Issues `<prefix><sequence>` numbers and records which consignment holds
// each one. Allocation and binding happen under one lock, so two concurrent
// creates can never observe the same next sequence. Numbers are never
// reissued; a number released after a failed append is simply skipped.
//
// ============================================================================

#[derive(Default)]
struct Ledger {
    /// prefix -> highest sequence handed out
    sequences: HashMap<String, u32>,
    /// number -> owning consignment
    holders: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct NumberRegistry {
    ledger: Mutex<Ledger>,
}

impl NumberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next number under `prefix` and bind it to `consignment_id`
    pub async fn issue(&self, prefix: &str, consignment_id: Uuid) -> Result<ConsignmentNumber, DomainError> {
        let mut ledger = self.ledger.lock().await;

        let current = ledger.sequences.get(prefix).copied().unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| DomainError::Conflict(format!("Number sequence exhausted for {}", prefix)))?;

        let number = ConsignmentNumber::compose(prefix, next);
        if ledger.holders.contains_key(number.as_str()) {
            return Err(DomainError::Conflict(format!(
                "Consignment number {} is already taken",
                number
            )));
        }

        ledger.sequences.insert(prefix.to_string(), next);
        ledger.holders.insert(number.as_str().to_string(), consignment_id);

        tracing::debug!(number = %number, consignment_id = %consignment_id, "Issued consignment number");
        Ok(number)
    }

    /// Drop the binding after a failed append. The sequence is not rewound.
    pub async fn release(&self, number: &ConsignmentNumber) {
        self.ledger.lock().await.holders.remove(number.as_str());
    }

    /// Exact-match lookup used by public tracking
    pub async fn lookup(&self, number: &str) -> Option<Uuid> {
        self.ledger.lock().await.holders.get(number.trim()).copied()
    }
}
