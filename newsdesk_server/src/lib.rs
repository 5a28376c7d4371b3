//! HTTP API for newsdesk.
//!
//! [`router`] builds the axum application: the public site API under
//! `/api`, the editorial dashboard API under `/api/admin` (guarded by
//! an administrator's bearer token) and, when configured, the uploaded
//! images. [`serve`] runs it on the configured address.

mod admin;
mod error;
mod middleware;
mod public;

use std::path::PathBuf;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use chrono::Duration;
use log::{error, info};
use newsdesk::config::NewsdeskConfig;
use newsdesk::storage::ObjectStore;
use newsdesk::{ConnectionPool, PooledConnection};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub use error::ApiError;
pub use middleware::Admin;

/// Header carrying the anonymous visitor key used for likes.
pub const VISITOR_HEADER: &str = "x-visitor-id";
/// Header carrying the original name of an uploaded file.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Shared state of the request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pool: ConnectionPool,
    store: Arc<dyn ObjectStore>,
    session_ttl: Duration,
    max_upload_bytes: u64,
    files: Option<(String, PathBuf)>,
}

impl AppState {
    pub fn new(pool: ConnectionPool, store: Arc<dyn ObjectStore>) -> Self {
        let defaults = NewsdeskConfig::default();
        AppState {
            pool,
            store,
            session_ttl: defaults.session_ttl(),
            max_upload_bytes: defaults.storage.max_upload_bytes,
            files: None,
        }
    }

    /// State for `config`: a connection pool for its database and its
    /// image bucket, served by the app when the bucket's public base
    /// URL is a local path.
    pub fn from_config(config: &NewsdeskConfig) -> newsdesk::Result<Self> {
        let pool = newsdesk::connection_pool(&config.database, config.pool_size)?;
        let mut state = AppState::new(pool, Arc::new(config.bucket()))
            .with_session_ttl(config.session_ttl())
            .with_max_upload_bytes(config.storage.max_upload_bytes);
        if config.storage.public_base_url.starts_with('/') {
            state = state.serving_files(&config.storage.public_base_url, &config.storage.root);
        }
        Ok(state)
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Serve the files in `dir` below the URL path `mount`.
    pub fn serving_files(mut self, mount: &str, dir: impl Into<PathBuf>) -> Self {
        let mount = format!("/{}", mount.trim_matches('/'));
        if mount != "/" {
            self.files = Some((mount, dir.into()));
        }
        self
    }

    /// Run `f` with a pooled connection on the blocking thread pool.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut PooledConnection) -> newsdesk::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = newsdesk::checkout(&pool)?;
            f(&mut conn)
        })
        .await?;
        Ok(result?)
    }
}

async fn health() -> &'static str {
    "ok"
}

/// The complete application.
pub fn router(state: AppState) -> Router {
    let site = public::routes().route_layer(from_fn_with_state(
        state.clone(),
        middleware::maintenance,
    ));
    let dashboard = admin::routes(&state).route_layer(from_fn_with_state(
        state.clone(),
        middleware::require_admin,
    ));
    let mut app = Router::new()
        .route("/health", get(health))
        .merge(public::auth_routes())
        .merge(site)
        .nest("/api/admin", dashboard);
    if let Some((mount, dir)) = &state.files {
        app = app.nest_service(mount, ServeDir::new(dir));
    }
    app.layer(from_fn(middleware::log_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Serve the application described by `config` until interrupted.
pub async fn serve(config: &NewsdeskConfig) -> newsdesk::Result<()> {
    let addr = config.listen_addr()?;
    let state = AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}/");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
