// ============================================================================
// Pickup Domain - pickup requests that precede a consignment
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;
pub mod projection;
pub mod requests;
pub mod intake;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::PickupRequest;
pub use command_handler::PickupCommandHandler;
pub use projection::PickupProjection;
pub use requests::*;
pub use intake::{PickupIntake, PickupRecord};
