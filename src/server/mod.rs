//! HTTP surface
//!
//! An axum router over [`PhaseOrchestrator`]. All project routes live under
//! `/api`; `/health` sits at the root.

pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validation;

pub use error::ApiError;
pub use routes::create_router;
pub use validation::{UploadValidator, ValidationReport};

use crate::pipeline::PhaseOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PhaseOrchestrator>,
    /// Upload size limit enforced by validation
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(orchestrator: Arc<PhaseOrchestrator>, max_upload_bytes: u64) -> Self {
        Self {
            orchestrator,
            max_upload_bytes,
        }
    }
}

/// Serves the router until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await
}
