//! HTTP API for the OrgChart service
//!
//! Thin axum layer over the `orgchart-core` services. Each resource lives in
//! its own endpoint module and contributes a `routes(state)` router that is
//! merged in [`create_router`].
//!
//! # Usage
//!
//! ```bash
//! ORGCHART_PORT=3100 cargo run -p orgchart-server
//! ```
//!
//! # Security
//!
//! - No authentication
//! - CORS allows any origin unless `CORS_ALLOW_ORIGIN` names one

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use orgchart_core::db::{DatabaseService, LibsqlStore, OrgStore};
use orgchart_core::services::{PhotoService, PositionService, UserService};

pub mod config;
mod http_error;
mod photo_endpoints;
mod position_endpoints;
mod user_endpoints;

pub use config::{ConfigError, ServerConfig};
pub use http_error::HttpError;

/// Application state shared across all endpoints
///
/// Services are stateless over a shared store, so handlers never lock.
#[derive(Clone)]
pub struct AppState {
    pub positions: Arc<PositionService>,
    pub users: Arc<UserService>,
    pub photos: Arc<PhotoService>,
}

impl AppState {
    /// Build all services over one store
    pub fn new(store: Arc<dyn OrgStore>) -> Self {
        Self {
            positions: Arc::new(PositionService::new(store.clone())),
            users: Arc::new(UserService::new(store.clone())),
            photos: Arc::new(PhotoService::new(store)),
        }
    }

    /// Open (or create) the database at `path` and build the services
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        let db = DatabaseService::new(path).await?;
        let store: Arc<dyn OrgStore> = Arc::new(LibsqlStore::new(Arc::new(db)));
        Ok(Self::new(store))
    }
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .merge(position_endpoints::routes(state.clone()))
        .merge(user_endpoints::routes(state.clone()))
        .merge(photo_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
}

/// CORS for browser clients
///
/// An origin that fails to parse falls back to allowing any origin;
/// `ServerConfig::validate` rejects such values before startup.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(value) => layer.allow_origin(value),
        None => layer.allow_origin(Any),
    }
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if the database cannot be opened or the listener fails to
/// bind.
pub async fn start_server(config: &ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Opening database at {}", config.database_path.display());
    let state = AppState::open(config.database_path.clone()).await?;
    let app = create_router(state, config.cors_allow_origin.as_deref());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("OrgChart server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
