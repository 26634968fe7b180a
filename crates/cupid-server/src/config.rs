//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use cupid_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_NEARBY_KM, MAX_MESSAGE_LEN};

/// Signing secret used when `JWT_SECRET` is unset. Development only.
const DEV_JWT_SECRET: &str = "cupid-dev-secret-change-me";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` to change only the port.
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// HS256 secret for bearer tokens.
    /// Env: `JWT_SECRET`
    pub jwt_secret: String,

    /// Allowed CORS origin. `None` allows any origin.
    /// Env: `CORS_ORIGIN`
    pub cors_origin: Option<String>,

    /// Maximum message length in characters, after trimming.
    /// Env: `MAX_MESSAGE_LEN`
    pub max_message_len: usize,

    /// Radius used by `/api/nearby` when the client does not send one.
    /// Env: `DEFAULT_NEARBY_KM`
    pub default_nearby_km: f64,

    /// Maximum number of concurrent WebSocket sessions.
    /// Env: `MAX_WS_CONNECTIONS`
    pub max_ws_connections: usize,

    /// Bearer token for `/admin/*`. Unset disables the admin API.
    /// Env: `ADMIN_TOKEN`
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            cors_origin: None,
            max_message_len: MAX_MESSAGE_LEN,
            default_nearby_km: DEFAULT_NEARBY_KM,
            max_ws_connections: 1024,
            admin_token: None,
        }
    }
}

// Secrets are kept out of the startup log.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("cors_origin", &self.cors_origin)
            .field("max_message_len", &self.max_message_len)
            .field("default_nearby_km", &self.default_nearby_km)
            .field("max_ws_connections", &self.max_ws_connections)
            .field("admin_enabled", &self.admin_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using development secret"),
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            if !origin.is_empty() && origin != "*" {
                config.cors_origin = Some(origin);
            }
        }

        if let Some(val) = lookup("MAX_MESSAGE_LEN") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_message_len = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_MESSAGE_LEN, using default"),
            }
        }

        if let Some(val) = lookup("DEFAULT_NEARBY_KM") {
            match val.parse::<f64>() {
                Ok(km) if km.is_finite() && km > 0.0 => config.default_nearby_km = km,
                _ => tracing::warn!(value = %val, "Invalid DEFAULT_NEARBY_KM, using default"),
            }
        }

        if let Some(val) = lookup("MAX_WS_CONNECTIONS") {
            match val.parse::<usize>() {
                Ok(n) => config.max_ws_connections = n,
                Err(_) => tracing::warn!(value = %val, "Invalid MAX_WS_CONNECTIONS, using default"),
            }
        }

        if let Some(token) = lookup("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
