// ============================================================================
// Authorization
// ============================================================================
//
// - session: acting user (role + home branch) and the token table
// - gate:    role allow-lists and branch scoping consulted by every component
//
// ============================================================================

pub mod gate;
pub mod session;

pub use gate::{allowed_roles, AuthorizationGate, Operation};
pub use session::{Role, Session, SessionError, SessionStore};
