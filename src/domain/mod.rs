// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler and read model
//
// This layer is completely separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod consignment;
pub mod pickup;
pub mod queue;
