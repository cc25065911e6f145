//! usergate - credential-based access control API
//! Mission: Authenticate users, gate admin operations, keep the admin out of the database

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usergate::{
    app_router,
    auth::{AuthState, CredentialVerifier, TokenCodec, UserRepository, UserStore},
    config::ServerConfig,
    users::{DiskImageStore, ImageStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = ServerConfig::parse();

    info!("🚀 usergate starting");

    let store: Arc<dyn UserRepository> = Arc::new(
        UserStore::open(&config.db_path)
            .with_context(|| format!("Failed to open user store at {}", config.db_path.display()))?,
    );
    let credentials = CredentialVerifier::new(store.clone(), config.admin_credentials())
        .context("Failed to initialize credential verifier")?;
    let tokens = TokenCodec::new(&config.jwt_secret());

    info!("🔐 Authentication initialized at: {}", config.db_path.display());

    let images: Arc<dyn ImageStore> = Arc::new(DiskImageStore::new(&config.upload_dir, "/uploads"));
    let state = AppState {
        auth: AuthState::new(store, tokens, credentials),
        images,
    };

    let app = app_router(state, config.max_body_bytes)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing from RUST_LOG
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "usergate=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate root .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
