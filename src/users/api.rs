//! User administration endpoints
//!
//! Everything here except the upload route sits behind both `authenticate`
//! and `require_admin`. Edits are plain read/modify/write: two admins
//! editing the same record concurrently resolve as last-writer-wins.

use crate::auth::{
    api::{blocking, json_body, require_fields, AuthState},
    models::{Principal, PrincipalProfile, Role},
};
use crate::error::ApiError;
use crate::routes::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial update; absent or empty fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImageRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub message: String,
    pub profile_image: String,
}

/// Record ids are UUIDs; anything else cannot exist in the store
fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create user - POST /api/users (Admin only)
pub async fn create_user(
    State(state): State<AuthState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PrincipalProfile>), ApiError> {
    let payload = json_body(body)?;
    require_fields(&[&payload.username, &payload.email, &payload.password])?;

    let credentials = state.credentials.clone();
    let principal = blocking(move || {
        credentials.create_user(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.role.unwrap_or_default(),
        )
    })
    .await?;

    info!(user_id = %principal.subject(), role = principal.role().as_str(), "Admin created user");

    Ok((StatusCode::CREATED, Json(principal.profile())))
}

/// List users - GET /api/users (Admin only)
pub async fn list_users(
    State(state): State<AuthState>,
) -> Result<Json<Vec<PrincipalProfile>>, ApiError> {
    let users = state.store.list()?;
    Ok(Json(users.iter().map(PrincipalProfile::from).collect()))
}

/// Search users - GET /api/users/search?query= (Admin only)
pub async fn search_users(
    State(state): State<AuthState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PrincipalProfile>>, ApiError> {
    let query = non_empty(params.query)
        .ok_or_else(|| ApiError::Validation("Search query is required".to_string()))?;

    let users = state.store.search(query.trim())?;
    Ok(Json(users.iter().map(PrincipalProfile::from).collect()))
}

/// Get user - GET /api/users/:id (Admin only)
pub async fn get_user(
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> Result<Json<PrincipalProfile>, ApiError> {
    let id = parse_user_id(&user_id)?;
    let record = state.store.find_by_id(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(PrincipalProfile::from(&record)))
}

/// Update user - PUT /api/users/:id (Admin only)
pub async fn update_user(
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PrincipalProfile>, ApiError> {
    let id = parse_user_id(&user_id)?;
    let patch = json_body(body)?;
    let mut record = state.store.find_by_id(&id)?.ok_or(ApiError::NotFound)?;

    if let Some(username) = non_empty(patch.username) {
        record.username = username;
    }
    if let Some(email) = non_empty(patch.email) {
        record.email = email;
    }
    if let Some(role) = patch.role {
        record.role = role;
    }
    if let Some(password) = non_empty(patch.password) {
        let credentials = state.credentials.clone();
        record.password_hash = blocking(move || credentials.hash_password(&password)).await?;
    }

    // unique constraints reject a username/email taken by another record
    state.store.save(&record)?;

    info!(user_id = %id, role = record.role.as_str(), "Admin updated user");

    Ok(Json(PrincipalProfile::from(&record)))
}

/// Delete user - DELETE /api/users/:id (Admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_user_id(&user_id)?;

    if let Principal::Stored(me) = &principal {
        if me.id == id {
            return Err(ApiError::CannotDeleteSelf);
        }
    }

    state.store.delete(&id)?;

    info!(user_id = %id, "Admin deleted user");

    Ok(Json(json!({ "message": "User removed" })))
}

/// Upload profile image - POST /api/users/upload (any authenticated principal)
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let payload = json_body(body)?;
    let image = non_empty(payload.image)
        .ok_or_else(|| ApiError::Validation("No image provided".to_string()))?;

    let id = match &principal {
        Principal::Stored(p) => p.id,
        Principal::SyntheticAdmin { .. } => {
            return Err(ApiError::Validation(
                "The configured admin has no editable profile".to_string(),
            ))
        }
    };

    let mut record = state.auth.store.find_by_id(&id)?.ok_or(ApiError::NotFound)?;
    let reference = state.images.upload(&image).await?;

    record.profile_image = Some(reference.clone());
    state.auth.store.save(&record)?;

    info!(user_id = %id, "Profile image updated");

    Ok(Json(UploadImageResponse {
        message: "Image uploaded successfully".to_string(),
        profile_image: reference,
    }))
}
