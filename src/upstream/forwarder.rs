//! Upstream forwarding.
//!
//! # Responsibilities
//! - Issue the upstream request with the sanitized headers
//! - Stream request and response bodies without buffering
//! - Return 3xx responses untouched (manual redirects)
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all requests
//! - `timeouts.request_secs` bounds the wait for response headers only; a slow
//!   body stream is never cut off
//! - No retries: a transport failure is the request's failure
//! - Bodies are never attached to GET/HEAD

use axum::body::Body;
use axum::http::{HeaderMap, Method};
use std::time::Duration;
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl OutboundRequest {
    /// Build an outbound request, dropping the body for methods that must not carry one.
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: Body) -> Self {
        let body = (!is_bodyless(&method)).then_some(body);
        Self {
            method,
            url,
            headers,
            body,
        }
    }
}

/// Methods forwarded without a body.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Sends outbound requests to the upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    response_timeout: Option<Duration>,
}

impl Forwarder {
    /// Build a forwarder whose client never follows redirects.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .no_proxy()
            .build()?;
        let response_timeout =
            (timeouts.request_secs > 0).then(|| Duration::from_secs(timeouts.request_secs));
        Ok(Self {
            client,
            response_timeout,
        })
    }

    /// Send the request and return the raw upstream response.
    ///
    /// The response body is not read; dropping the response (or the future)
    /// releases the upstream connection.
    pub async fn forward(&self, request: OutboundRequest) -> Result<reqwest::Response, ProxyError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let send = builder.send();
        let response = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(limit))??,
            None => send.await?,
        };
        Ok(response)
    }
}
