//! REST API server for beatscribe.
//!
//! Provides HTTP endpoints for:
//! - Take control (start, stop, cancel, status)
//! - Service info and version

pub mod error;
pub mod routes;

use crate::config::Config;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::session::{ApiCommand, SessionState, StartRequest};

pub struct ApiServer {
    port: u16,
    session_state: SessionState,
}

impl ApiServer {
    pub fn new(
        tx: tokio::sync::mpsc::Sender<ApiCommand>,
        status: crate::session::TakeStatusHandle,
        config: &Config,
    ) -> Self {
        Self {
            port: config.api.port,
            session_state: SessionState {
                tx,
                status,
                defaults: config.take.clone(),
            },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            // Take control endpoints
            .merge(routes::session::router(self.session_state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /         - Service info");
        info!("  POST /start    - Start a take (optional JSON overrides)");
        info!("  POST /stop     - Finish the take and upload it");
        info!("  POST /cancel   - Abort the take, discarding audio");
        info!("  GET  /status   - Get session status");
        info!("  GET  /version  - Get version info");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "beatscribe",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "beatscribe"
    }))
}
