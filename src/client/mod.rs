//! Client Module
//! Mission: Keep the signed-in session, persist it, and gate views by role

pub mod api;
pub mod error;
pub mod guard;
pub mod session;
pub mod storage;
pub mod users;
pub mod validate;

pub use api::{AuthApi, HttpAuthApi, UserAdminApi, DEFAULT_API_BASE};
pub use error::ClientError;
pub use guard::{decide, GuardedRoute, RouteDecision, RouteRequirement};
pub use session::{
    ClientSessionStore, LoginKind, LoginOutcome, Notice, SessionPhase, SessionPrincipal,
    SessionState,
};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use users::{UserAdminState, UserAdminStore};
