//! Authentication API Endpoints
//! Mission: Register, log in and report the current principal

use crate::auth::{
    credentials::CredentialVerifier,
    jwt::TokenCodec,
    models::{AuthResponse, LoginRequest, Principal, PrincipalProfile, RegisterRequest},
    resolver::PrincipalResolver,
    user_store::UserRepository,
};
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn UserRepository>,
    pub tokens: Arc<TokenCodec>,
    pub resolver: Arc<PrincipalResolver>,
    pub credentials: Arc<CredentialVerifier>,
}

impl AuthState {
    pub fn new(
        store: Arc<dyn UserRepository>,
        tokens: TokenCodec,
        credentials: CredentialVerifier,
    ) -> Self {
        let resolver = PrincipalResolver::new(store.clone(), credentials.admin_email().to_string());
        Self {
            store,
            tokens: Arc::new(tokens),
            resolver: Arc::new(resolver),
            credentials: Arc::new(credentials),
        }
    }

    fn respond_with_token(&self, principal: &Principal) -> Result<AuthResponse, ApiError> {
        let token = self.tokens.issue(&principal.subject())?;
        Ok(AuthResponse {
            profile: principal.profile(),
            token,
        })
    }
}

/// Unwrap a JSON body, turning any decoding failure into a 400
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|_| ApiError::Validation("Invalid user data".to_string()))
}

/// Run bcrypt work on the blocking pool so hashing never stalls the async workers
pub(crate) async fn blocking<T, E, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Upstream(format!("credential task failed: {e}")))?
        .map_err(Into::into)
}

pub(crate) fn require_fields(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::Validation("Invalid user data".to_string()));
    }
    Ok(())
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let payload = json_body(body)?;
    require_fields(&[&payload.username, &payload.email, &payload.password])?;

    let credentials = state.credentials.clone();
    let principal = blocking(move || {
        credentials.register(&payload.username, &payload.email, &payload.password)
    })
    .await?;

    info!(user_id = %principal.subject(), "Registered new user");

    Ok((StatusCode::CREATED, Json(state.respond_with_token(&principal)?)))
}

/// Login endpoint - POST /api/auth/login
///
/// The configured admin may log in here too; whether a non-admin login
/// surface accepts that is up to the client.
pub async fn login(
    State(state): State<AuthState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let payload = json_body(body)?;
    let credentials = state.credentials.clone();
    let principal =
        blocking(move || credentials.verify_login(&payload.email, &payload.password)).await?;

    Ok(Json(state.respond_with_token(&principal)?))
}

/// Current principal - GET /api/auth/profile
pub async fn profile(Extension(principal): Extension<Principal>) -> Json<PrincipalProfile> {
    Json(principal.profile())
}
