//! API Errors
//! Mission: One response shape for every failed request

use crate::auth::{
    credentials::CredentialError, jwt::TokenError, resolver::ResolveError, user_store::StoreError,
};
use crate::users::images::ImageStoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error returned by every handler and gate, rendered as `{"message": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// Malformed client input
    Validation(String),
    /// Wrong email or password, identical for unknown accounts
    Credential,
    MissingToken,
    InvalidToken,
    /// Authenticated but not an admin
    Forbidden,
    /// Duplicate username or email
    Conflict,
    NotFound,
    CannotDeleteSelf,
    /// Storage or blob failure; detail is logged, never returned
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict | ApiError::CannotDeleteSelf => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Credential | ApiError::MissingToken | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg) => msg,
            ApiError::Credential => "Invalid email or password",
            ApiError::MissingToken => "Not authorized, no token",
            ApiError::InvalidToken => "Not authorized, invalid token",
            ApiError::Forbidden => "Not authorized as an admin",
            ApiError::Conflict => "User already exists",
            ApiError::NotFound => "User not found",
            ApiError::CannotDeleteSelf => "Cannot delete your own account",
            ApiError::Upstream(_) => "Server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream(detail) = &self {
            error!(detail = %detail, "Upstream failure");
        }

        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ApiError::Conflict,
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Database(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Rejected => ApiError::Credential,
            CredentialError::AlreadyExists => ApiError::Conflict,
            CredentialError::Hash(e) => ApiError::Upstream(e.to_string()),
            CredentialError::Store(e) => e.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound => ApiError::NotFound,
            ResolveError::Store(e) => e.into(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => ApiError::InvalidToken,
            TokenError::Signing(detail) => ApiError::Upstream(detail),
        }
    }
}

impl From<ImageStoreError> for ApiError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::InvalidImage(msg) => ApiError::Validation(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}
