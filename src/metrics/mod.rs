// Private module declaration
mod server;

use std::future::Future;
use std::time::Instant;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

use crate::error::DomainError;

pub use server::metrics_routes;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Consignment creation and status transitions
// - Truck queue assignments
// - Pickup request operations
// - Authorization denials
// - Domain errors by kind and command latency
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Consignment lifecycle
    pub consignments_created: IntCounter,
    pub status_transitions: IntCounterVec,
    pub truck_assignments: IntCounter,

    // Pickup intake
    pub pickup_operations: IntCounterVec,

    // Authorization & errors
    pub authorization_denied: IntCounterVec,
    pub domain_errors: IntCounterVec,

    pub command_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let consignments_created = IntCounter::new(
            "consignments_created_total",
            "Total consignment notes created",
        )?;
        registry.register(Box::new(consignments_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("consignment_status_transitions_total", "Consignment status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let truck_assignments = IntCounter::new(
            "truck_assignments_total",
            "Total consignments assigned to a truck",
        )?;
        registry.register(Box::new(truck_assignments.clone()))?;

        let pickup_operations = IntCounterVec::new(
            Opts::new("pickup_operations_total", "Pickup request operations"),
            &["operation"],
        )?;
        registry.register(Box::new(pickup_operations.clone()))?;

        let authorization_denied = IntCounterVec::new(
            Opts::new("authorization_denied_total", "Requests rejected by the authorization gate"),
            &["operation"],
        )?;
        registry.register(Box::new(authorization_denied.clone()))?;

        let domain_errors = IntCounterVec::new(
            Opts::new("domain_errors_total", "Domain errors returned to callers"),
            &["kind"],
        )?;
        registry.register(Box::new(domain_errors.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("command_duration_seconds", "Command handling duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        Ok(Self {
            registry,
            consignments_created,
            status_transitions,
            truck_assignments,
            pickup_operations,
            authorization_denied,
            domain_errors,
            command_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_status_transition(&self, from: &str, to: &str) {
        self.status_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_pickup_operation(&self, operation: &str) {
        self.pickup_operations.with_label_values(&[operation]).inc();
    }

    pub fn record_denied(&self, operation: &str) {
        self.authorization_denied.with_label_values(&[operation]).inc();
    }

    pub fn record_error(&self, kind: &str) {
        self.domain_errors.with_label_values(&[kind]).inc();
    }

    pub fn observe_command(&self, command: &str, duration_secs: f64) {
        self.command_duration.with_label_values(&[command]).observe(duration_secs);
    }

    /// Time a component call and count its failure kind, if any
    pub async fn instrument<T, F>(&self, command: &str, work: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let started = Instant::now();
        let outcome = work.await;
        self.observe_command(command, started.elapsed().as_secs_f64());
        if let Err(error) = &outcome {
            self.record_error(error.kind().as_str());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.consignments_created.inc();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_status_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_status_transition("PENDING", "MUAT");
        metrics.record_status_transition("MUAT", "TRANSIT");
        metrics.record_status_transition("PENDING", "MUAT");

        let gathered = metrics.registry().gather();
        let transitions = gathered
            .iter()
            .find(|m| m.name() == "consignment_status_transitions_total")
            .unwrap();
        assert_eq!(transitions.metric.len(), 2);
    }

    #[tokio::test]
    async fn test_instrument_counts_failures() {
        let metrics = Metrics::new().unwrap();

        let ok: Result<u32, DomainError> = metrics.instrument("create_pickup", async { Ok(1) }).await;
        assert_eq!(ok.unwrap(), 1);

        let err: Result<u32, DomainError> = metrics
            .instrument("create_pickup", async { Err(DomainError::Conflict("locked".to_string())) })
            .await;
        assert!(err.is_err());

        assert_eq!(metrics.domain_errors.with_label_values(&["conflict"]).get(), 1);
        assert_eq!(
            metrics.command_duration.with_label_values(&["create_pickup"]).get_sample_count(),
            2
        );
    }

    #[test]
    fn test_record_denied() {
        let metrics = Metrics::new().unwrap();
        metrics.record_denied("create_consignment");
        metrics.record_denied("create_consignment");

        assert_eq!(
            metrics
                .authorization_denied
                .with_label_values(&["create_consignment"])
                .get(),
            2
        );
    }
}
