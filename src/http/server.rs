//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router for `/higlass/{id}/{*rest}` under the base URL
//! - Wire up middleware (tracing, request ID)
//! - Buffer inbound bodies within the configured limit
//! - Translate, dispatch and reconcile each request
//! - Bind server to listener with graceful shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::OutboundRequest;
use crate::http::response::reconcile;
use crate::lifecycle::signals::shutdown_signal;
use crate::net::{dispatch, DispatchOptions, TransportErrorKind};
use crate::observability::metrics;
use crate::routing::{nest_prefix, ProxyTarget, TargetId};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub base_url: Arc<str>,
    pub sockets_dir: Arc<PathBuf>,
    pub dispatch: DispatchOptions,
    pub max_body_size: usize,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            base_url: Arc::from(config.proxy.base_url.as_str()),
            sockets_dir: Arc::new(config.proxy.sockets_dir.clone()),
            dispatch: DispatchOptions::from_config(config),
            max_body_size: config.limits.max_body_size,
        }
    }
}

/// Path captures of the proxy routes. `rest` is absent on `/higlass/{id}/`.
#[derive(Debug, Deserialize)]
struct ProxyPath {
    id: String,
    #[serde(default)]
    rest: String,
}

/// HTTP server for the socket proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let router = Self::build_router(&config, AppState::from_config(&config));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let proxy = Router::new()
            .route("/higlass/{id}/", any(proxy_handler))
            .route("/higlass/{id}/{*rest}", any(proxy_handler))
            .with_state(state);

        let app = match nest_prefix(&config.proxy.base_url) {
            Some(prefix) => Router::new().nest(&prefix, proxy),
            None => proxy,
        };

        app.layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl+C, SIGTERM or a shutdown broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_url = %self.config.proxy.base_url,
            sockets_dir = %self.config.proxy.sockets_dir.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Translates the request, forwards it over the target socket and reconciles the answer.
async fn proxy_handler(
    State(state): State<AppState>,
    Path(path): Path<ProxyPath>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let Some(id) = TargetId::parse(&path.id) else {
        tracing::debug!(id = %path.id, "Rejecting non-numeric target id");
        metrics::record_request(method.as_str(), 404, "rejected", start_time);
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };
    let target = ProxyTarget::resolve(&state.sockets_dir, id);

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = if is_length_limit(&e) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(target_id = %target.id, error = %e, "Failed to read request body");
            metrics::record_request(method.as_str(), status.as_u16(), "rejected", start_time);
            return (status, e.to_string()).into_response();
        }
    };

    let target_id = target.id.clone();
    let outbound = OutboundRequest::build(&parts, &path.rest, body, target, &state.base_url);
    let outcome = dispatch(outbound, &state.dispatch).await;

    let label = match &outcome {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(target_id = %target_id, error = %e, "Backend request failed");
            match e.kind() {
                TransportErrorKind::Timeout => "timeout",
                TransportErrorKind::Other => "error",
            }
        }
    };

    let response = reconcile(outcome);
    metrics::record_request(method.as_str(), response.status().as_u16(), label, start_time);
    response
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
