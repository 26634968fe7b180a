//! # cupid-server
//!
//! HTTP and realtime server for the Cupid dating backend.
//!
//! This binary provides:
//! - **REST API** (axum) for swiping, matches, conversations, messages,
//!   moderation, discovery and account state
//! - **WebSocket transport** pushing new messages, typing indicators and
//!   read receipts to connected sessions
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod auth;
mod config;
mod error;
mod extract;
mod rate_limit;
mod realtime;
mod ws;

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cupid_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cupid_server=debug")),
        )
        .init();

    info!("Starting Cupid server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs migrations)
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => {
            info!(path = %path.display(), "Opening database");
            Database::open_at(path)?
        }
        None => Database::new()?,
    };

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Rate limiter cleanup every 5 minutes, evicting clients idle >10 min
    tokio::spawn(
        app_state
            .rate_limiter
            .clone()
            .run_purge(Duration::from_secs(300), Duration::from_secs(600)),
    );

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
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
