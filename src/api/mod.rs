//! HTTP surface over the filesystem services.
//!
//! Handlers validate query parameters, hand the filesystem work to the
//! blocking pool and translate service errors into status codes.

pub mod error;
pub mod handlers;

use crate::core::config::{RootDirectory, DEFAULT_MAX_UPLOAD_BYTES};
use crate::core::errors::Result;
use crate::services::fs::browser::FileBrowser;
use crate::services::fs::ops::FileOps;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub browser: FileBrowser,
    pub ops: FileOps,
}

impl AppState {
    pub fn new(root: &RootDirectory) -> Self {
        Self {
            browser: FileBrowser::new(root),
            ops: FileOps::new(root),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

pub fn router(state: AppState, options: &ServerOptions) -> Router {
    let api = Router::new()
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/upload", post(handlers::upload))
        .route("/api/files/download", get(handlers::download))
        .route("/api/files/delete", delete(handlers::delete))
        .route("/api/files/action", post(handlers::transfer))
        .route("/api/files/directories", get(handlers::directories))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .with_state(Arc::new(state));

    let app = match &options.static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(TraceLayer::new_for_http())
}

/// Runs filesystem work on the blocking pool so it never stalls the reactor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f).await?
}
