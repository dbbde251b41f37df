// ============================================================================
// Queue Domain - moving consignments onto trucks
// ============================================================================

pub mod service;

pub use service::{AssignTruckRequest, AssignmentRecord, QueueAssignmentService, TruckAssignment};
