//! HTTP boundary.
//!
//! Exposes a health check on `GET /` and the merge operation on
//! `POST /merge`. Each merge request gets its own [`Pipeline`]; the only
//! state shared between requests is the read-only configuration and the
//! object store client.
//!
//! [`Pipeline`]: crate::pipeline::Pipeline

pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthResponse, MergeResponse, SECRET_HEADER};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::storage::ObjectStore;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration.
    pub config: Arc<Config>,
    /// Object store client.
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Bundle the configuration and store for the router.
    pub fn new(config: Arc<Config>, store: Arc<dyn ObjectStore>) -> Self {
        Self { config, store }
    }
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::health))
        .route("/merge", post(handlers::merge))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: Arc<Config>, store: Arc<dyn ObjectStore>) -> Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    info!(
        "PDF merge service running on {} (storage: {})",
        listener.local_addr()?,
        store.backend_name()
    );

    serve_with_shutdown(listener, AppState::new(config, store), shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve_with_shutdown<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}
