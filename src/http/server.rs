//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing, request ID)
//! - Run the proxy pipeline for each request
//! - Graceful shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{inbound_url, request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::into_client_response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::security::headers::HeaderPolicy;
use crate::upstream::{build_upstream_url, Forwarder, OutboundRequest, TargetError, UpstreamTarget};

/// Error building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream target: {0}")]
    Target(#[from] TargetError),

    #[error("invalid public origin: {0}")]
    PublicOrigin(#[from] url::ParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
///
/// Everything here is immutable for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<UpstreamTarget>,
    pub header_policy: Arc<HeaderPolicy>,
    pub forwarder: Forwarder,
    pub public_origin: Option<Arc<Url>>,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        let public_origin = config
            .listener
            .public_origin
            .as_deref()
            .map(Url::parse)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            target: Arc::new(UpstreamTarget::from_config(&config.upstream)?),
            header_policy: Arc::new(HeaderPolicy::from_config(&config.upstream)),
            forwarder: Forwarder::new(&config.timeouts)?,
            public_origin,
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.target,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait_for(shutdown))
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
/// Maps the request onto the upstream, forwards it, and rewrites the response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts).to_string();
    let method = parts.method.clone();

    let inbound = inbound_url(&parts, state.public_origin.as_deref()).inspect_err(|e| {
        tracing::warn!(request_id = %request_id, peer = %peer, error = %e, "Rejecting request");
        metrics::record_request(method.as_str(), e.status().as_u16(), start_time);
    })?;

    let upstream_url = build_upstream_url(&inbound, &state.target);
    let headers = state.header_policy.sanitize(&parts.headers, &state.target);

    tracing::debug!(
        request_id = %request_id,
        peer = %peer,
        method = %method,
        path = %inbound.path(),
        upstream = %upstream_url,
        "Proxying request"
    );

    let outbound = OutboundRequest::new(method.clone(), upstream_url, headers, body);
    let upstream = match state.forwarder.forward(outbound).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), e.status().as_u16(), start_time);
            return Err(e);
        }
    };

    let status = upstream.status();
    tracing::debug!(request_id = %request_id, status = %status, "Upstream responded");
    metrics::record_request(method.as_str(), status.as_u16(), start_time);

    Ok(into_client_response(upstream, &inbound, &state.target))
}
