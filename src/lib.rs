//! usergate Library
//!
//! Server side: token issuance and verification, principal resolution with a
//! configuration-backed admin, role-gated user administration.
//! Client side: session state machine, durable session storage and route guard.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod users;

pub use error::ApiError;
pub use routes::{app_router, AppState};
