//! # gallery-server
//!
//! Self-hosted photo gallery.
//!
//! This binary provides:
//! - **Public feed** of images, paginated and filterable by category
//! - **Session login** for the administrator (Argon2id passwords, signed
//!   session tokens in an HttpOnly cookie)
//! - **Image management**: upload with thumbnail derivation, metadata edits,
//!   and deletion of records together with their files
//! - **Static serving** of the asset tree under the public endpoint
//! - **Per-IP throttling** of login attempts

mod api;
mod assets;
mod auth;
mod config;
mod error;
mod images;
mod rate_limit;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gallery_shared::{CredentialVerifier, TokenService};
use gallery_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::assets::AssetStore;
use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::images::ImageStore;
use crate::rate_limit::LoginThrottle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gallery_server=debug")),
        )
        .init();

    info!("Starting gallery server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // One connection for the whole process, handed to each component.
    let db = Arc::new(Mutex::new(Database::open_at(&config.database_path)?));

    let assets = AssetStore::new(
        config.image_directory.clone(),
        config.gallery_endpoint.clone(),
    )?;

    let verifier = CredentialVerifier::new(
        config
            .password_pepper
            .as_ref()
            .map(|pepper| pepper.as_bytes().to_vec()),
    );
    let tokens = TokenService::new(&config.auth_secret, &config.auth_salt);
    let auth = AuthService::new(db.clone(), verifier, tokens);

    let provisioning = auth.clone();
    let (username, email, password) = (
        config.admin_username.clone(),
        config.admin_email.clone(),
        config.admin_password.clone(),
    );
    let created = tokio::task::spawn_blocking(move || {
        provisioning.provision_admin(&username, &email, &password)
    })
    .await??;
    info!(
        username = %config.admin_username,
        created,
        "Admin account ready"
    );

    let login_throttle = LoginThrottle::per_minute(config.login_attempts_per_minute);

    let app_state = AppState {
        images: ImageStore::new(db, assets),
        auth,
        login_throttle: login_throttle.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic throttle cleanup (every 5 minutes, evict clients idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            login_throttle.purge_idle(Duration::from_secs(600)).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
