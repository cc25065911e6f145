//! HTTP router assembly

use crate::auth::{api as auth_api, authenticate, require_admin, AuthState};
use crate::middleware::request_logging;
use crate::users::{api as users_api, ImageStore};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub images: Arc<dyn ImageStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Build the API router.
///
/// Layer order matters: `route_layer` calls run outermost-last, so
/// `authenticate` always runs before `require_admin`.
pub fn app_router(state: AppState, max_body_bytes: usize) -> Router {
    // Public auth routes
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login));

    // Any authenticated principal
    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth_api::profile))
        .route("/api/users/upload", post(users_api::upload_profile_image))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            authenticate,
        ));

    // Admin only
    let admin_routes = Router::new()
        .route(
            "/api/users",
            post(users_api::create_user).get(users_api::list_users),
        )
        .route("/api/users/search", get(users_api::search_users))
        .route(
            "/api/users/:id",
            get(users_api::get_user)
                .put(users_api::update_user)
                .delete(users_api::delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            authenticate,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "API is running..."
}

async fn health_check() -> &'static str {
    "OK"
}
