//! Configuration endpoint.
//!
//! - `GET /api/config`: re-reads the settings source and returns the resolved
//!   [`AppConfiguration`] as JSON
//! - `GET /healthz`: liveness probe
//!
//! Any other method on `/api/config` gets `405` with `Allow: GET`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::Result;
use crate::settings::{AppConfiguration, ConfigHandle, ConfigSource, ResolveEnv, CONFIG_ENDPOINT};

/// Shared state behind the router.
#[derive(Clone)]
pub struct ServerState {
    source: Arc<dyn ConfigSource>,
    env: ResolveEnv,
    config: ConfigHandle,
}

impl ServerState {
    pub fn new(source: Arc<dyn ConfigSource>, env: ResolveEnv, config: ConfigHandle) -> Self {
        Self {
            source,
            env,
            config,
        }
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            CONFIG_ENDPOINT,
            get(get_config).fallback(method_not_allowed),
        )
        .route("/healthz", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn get_config(State(state): State<ServerState>) -> Json<AppConfiguration> {
    let config = state.config.reload(state.source.as_ref(), &state.env).await;
    Json(config.as_ref().clone())
}

async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        format!("Method {} Not Allowed", method),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// HTTP server bound to a listening socket.
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    pub async fn bind(addr: SocketAddr, state: ServerState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            app: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<()> {
        info!("Serving configuration on {}", self.local_addr()?);
        axum::serve(self.listener, self.app).await?;
        Ok(())
    }
}
