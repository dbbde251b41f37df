use std::collections::HashMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope, serialize_event, deserialize_event};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Type Parameter:
// - `E`: The domain event type (must implement DomainEvent trait)
//
// Responsibilities:
// 1. Append events to a per-aggregate stream (append-only)
// 2. Load event history for aggregates
// 3. Ensure optimistic concurrency control
//
// Payloads are kept serialized, the same shape a durable backend stores,
// so every load goes through the event's serde contract.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot append empty event list")]
    EmptyBatch,

    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    #[error("Failed to replay aggregate {aggregate_id}: {reason}")]
    Replay { aggregate_id: Uuid, reason: String },

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct StoredEvent {
    sequence_number: i64,
    event_id: Uuid,
    event_type: String,
    event_version: i32,
    payload: String,
    correlation_id: Uuid,
    user_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
    aggregate_type_name: String,
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }

    /// Append events to the event store
    /// Returns the new version number after appending
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        // Serialize before taking the lock so a bad payload never half-writes
        let mut rows = Vec::with_capacity(events.len());
        let mut new_version = expected_version;
        for envelope in &events {
            new_version += 1;
            rows.push(StoredEvent {
                sequence_number: new_version,
                event_id: envelope.event_id,
                event_type: envelope.event_type.clone(),
                event_version: envelope.event_version,
                payload: serialize_event(&envelope.event_data)?,
                correlation_id: envelope.correlation_id,
                user_id: envelope.user_id,
                timestamp: envelope.timestamp,
                metadata: envelope.metadata.clone(),
            });
        }

        let mut streams = self.streams.write().await;

        // A rejected append must not leave an empty stream behind
        let current_version = streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |e| e.sequence_number);
        if current_version != expected_version {
            tracing::warn!(
                aggregate_id = %aggregate_id,
                aggregate_type = %self.aggregate_type_name,
                expected_version,
                current_version,
                "Rejected append on stale version"
            );
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        streams.entry(aggregate_id).or_default().extend(rows);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = events.len(),
            "Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate
    pub async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let streams = self.streams.read().await;
        let Some(stream) = streams.get(&aggregate_id) else {
            return Ok(Vec::new());
        };

        let mut events = Vec::with_capacity(stream.len());
        for row in stream {
            let event_data: E = deserialize_event(&row.payload)?;
            events.push(EventEnvelope {
                event_id: row.event_id,
                aggregate_id,
                sequence_number: row.sequence_number,
                event_type: row.event_type.clone(),
                event_version: row.event_version,
                event_data,
                correlation_id: row.correlation_id,
                user_id: row.user_id,
                timestamp: row.timestamp,
                metadata: row.metadata.clone(),
            });
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    /// Load aggregate from events
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A, StoreError>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;

        if events.is_empty() {
            return Err(StoreError::AggregateNotFound(aggregate_id));
        }

        A::load_from_events(events).map_err(|e| StoreError::Replay {
            aggregate_id,
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
