//! Shared fixtures for the integration tests

#![allow(dead_code)]

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use usergate::{
    app_router,
    auth::{
        AdminCredentials, AdminSecret, AuthState, CredentialVerifier, TokenCodec, UserRepository,
        UserStore,
    },
    users::DiskImageStore,
    AppState,
};

pub const ADMIN_EMAIL: &str = "root@example.com";
pub const ADMIN_PASSWORD: &str = "Adm1n!secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<UserStore>,
    pub uploads: TempDir,
}

/// Router over an in-memory store with cheap bcrypt cost
pub fn test_app() -> TestApp {
    let store = Arc::new(UserStore::in_memory().expect("in-memory store"));
    let repo: Arc<dyn UserRepository> = store.clone();
    let admin = AdminCredentials {
        email: ADMIN_EMAIL.to_string(),
        secret: AdminSecret::Plain(ADMIN_PASSWORD.to_string()),
    };
    let credentials = CredentialVerifier::with_hash_cost(repo.clone(), admin, 4).expect("verifier");
    let uploads = tempfile::tempdir().expect("upload dir");

    let state = AppState {
        auth: AuthState::new(repo, TokenCodec::new("integration-secret"), credentials),
        images: Arc::new(DiskImageStore::new(uploads.path(), "/uploads")),
    };

    TestApp {
        router: app_router(state, 1024 * 1024),
        store,
        uploads,
    }
}

/// Serve the router on an ephemeral port, returning the `/api` base URL
pub async fn spawn_server(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server");
    });
    format!("http://{addr}/api")
}
