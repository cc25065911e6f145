//! Authentication Module
//! Mission: Token issuance, principal resolution and role-gated access

pub mod api;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod resolver;
pub mod user_store;

pub use api::AuthState;
pub use credentials::{AdminCredentials, AdminSecret, CredentialVerifier};
pub use jwt::TokenCodec;
pub use middleware::{authenticate, require_admin};
pub use models::{Principal, PrincipalProfile, Role};
pub use resolver::PrincipalResolver;
pub use user_store::{UserRepository, UserStore};
