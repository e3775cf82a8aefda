//! Request-time errors and their mapping to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single proxied request.
///
/// Header rewriting never fails a request; only the inbound request itself
/// or the upstream call can.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream call could not complete (DNS, connect, timeout, transport).
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The upstream did not produce response headers within the configured limit.
    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    /// The inbound request URL could not be reconstructed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ProxyError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(e) if e.is_timeout() => "timeout",
            ProxyError::Upstream(e) if e.is_connect() => "connect",
            ProxyError::Upstream(_) => "transport",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::Upstream(_) | ProxyError::UpstreamTimeout(_) => "Upstream request failed",
            ProxyError::BadRequest(_) => "Bad request",
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let err = ProxyError::BadRequest("missing host".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "bad_request");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn response_header_timeout_maps_to_504() {
        let err = ProxyError::UpstreamTimeout(Duration::from_secs(1));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn unreachable_upstream_maps_to_502() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();
        let err = ProxyError::from(err);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
