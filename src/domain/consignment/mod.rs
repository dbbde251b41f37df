// ============================================================================
// Consignment Domain - the consignment note (STT) from creation to closure
// ============================================================================
//
// - Value objects (status, cargo, pricing, consignment number)
// - Events, commands and business rule errors
// - Aggregate (ConsignmentNote) and its command handler
// - Number registry, read model and joined queries
// - ConsignmentRegistry, the facade the rest of the crate talks to
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;
pub mod numbering;
pub mod projection;
pub mod requests;
pub mod queries;
pub mod registry;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::ConsignmentNote;
pub use command_handler::ConsignmentCommandHandler;
pub use numbering::NumberRegistry;
pub use projection::{ConsignmentFilter, ConsignmentProjection};
pub use requests::*;
pub use queries::{ConsignmentQueries, ConsignmentRecord, TrackingSummary};
pub use registry::ConsignmentRegistry;
