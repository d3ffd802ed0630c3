//! HTTP server setup.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::HeaderValue;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::routes;
use crate::service::Services;
use crate::storage::DEFAULT_DB_PATH;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default listen address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default path segment in front of every route.
pub const DEFAULT_API_PREFIX: &str = "api";
/// Default allowed browser origin.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Path segment in front of every route, without slashes.
    pub api_prefix: String,
    /// Allowed browser origin; `*` allows any.
    pub cors_origin: String,
    /// `SQLite` database file.
    pub database_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            database_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl ServerConfig {
    /// Settings from `PORT`, `HOST`, `API_PREFIX`, `CORS_ORIGIN` and
    /// `DATABASE_PATH`, with defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from `lookup`. Blank or unparsable values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            api_prefix: get("API_PREFIX").unwrap_or(defaults.api_prefix),
            cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            database_path: get("DATABASE_PATH")
                .map_or(defaults.database_path, PathBuf::from),
        }
    }

    /// `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// State shared across handlers.
#[derive(Debug)]
pub struct AppState {
    /// Application services.
    pub services: Services,
    /// Server start time.
    pub started_at: Instant,
}

impl AppState {
    /// Wraps `services`.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            started_at: Instant::now(),
        }
    }
}

/// Builds the application router: every route nested under the API
/// prefix, with CORS and request tracing.
///
/// # Errors
///
/// Returns an error if the CORS origin is not a valid header value.
pub fn build_router(state: AppState, config: &ServerConfig) -> anyhow::Result<Router> {
    let api = routes::api_routes().with_state(Arc::new(state));
    let prefix = config.api_prefix.trim_matches('/');
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{prefix}"), api)
    };
    Ok(app
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin: HeaderValue = origin
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin:?}: {e}"))?;
    Ok(layer.allow_origin(origin))
}

/// Serves the API until Ctrl-C or until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails to bind or encounters a runtime
/// error.
pub async fn serve(
    state: AppState,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let router = build_router(state, config)?;
    let addr = config.addr();
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "daily-english API listening on http://{addr}/{}",
        config.api_prefix.trim_matches('/')
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => shutdown.cancel(),
                () = shutdown.cancelled() => {}
            }
            info!("shutting down");
        })
        .await?;

    Ok(())
}
