//! Authorization Gate
//! Mission: Protect API endpoints with bearer-token authentication and admin checks

use crate::auth::{api::AuthState, models::Principal};
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

/// Verifies the bearer token, resolves the principal and attaches it to the
/// request extensions. Every request re-verifies; nothing is cached.
pub async fn authenticate(
    State(auth): State<AuthState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::MissingToken);
    };

    let subject = auth
        .tokens
        .verify(bearer.token())
        .map_err(|_| ApiError::InvalidToken)?;

    let principal = auth.resolver.resolve(&subject)?;
    debug!(subject = %subject, role = principal.role().as_str(), "Request authenticated");

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Rejects with 403 unless the attached principal is an admin.
/// Must be layered inside `authenticate`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    match extract_principal(&req) {
        Some(principal) if principal.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(ApiError::Forbidden),
        None => Err(ApiError::MissingToken),
    }
}

/// Extract the principal from a request (use after `authenticate`)
pub fn extract_principal(req: &Request) -> Option<&Principal> {
    req.extensions().get::<Principal>()
}
