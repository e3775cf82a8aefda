//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream target is an absolute http(s) URL
//! - Validate addresses, origins and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.target must be set")]
    MissingTarget,

    #[error("upstream.target {0:?} is not an absolute http(s) URL with a host")]
    InvalidTarget(String),

    #[error("upstream.entry_marker {0:?} must be empty or start with '/'")]
    InvalidEntryMarker(String),

    #[error("upstream header strip rule {0:?} must be a non-empty header name")]
    InvalidStripRule(String),

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.public_origin {0:?} is not an absolute http(s) origin")]
    InvalidPublicOrigin(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let target = config.upstream.target.trim();
    if target.is_empty() {
        errors.push(ValidationError::MissingTarget);
    } else if parse_http_url(target).is_none() {
        errors.push(ValidationError::InvalidTarget(target.to_string()));
    }

    let marker = &config.upstream.entry_marker;
    if !marker.is_empty() && (!marker.starts_with('/') || marker.len() < 2) {
        errors.push(ValidationError::InvalidEntryMarker(marker.clone()));
    }

    for rule in config
        .upstream
        .strip_headers
        .iter()
        .chain(config.upstream.strip_header_prefixes.iter())
    {
        if rule.trim().is_empty() || rule.contains(|c: char| c.is_whitespace() || c == ':') {
            errors.push(ValidationError::InvalidStripRule(rule.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(origin) = &config.listener.public_origin {
        let is_origin = parse_http_url(origin)
            .map(|url| url.path() == "/" && url.query().is_none() && url.fragment().is_none())
            .unwrap_or(false);
        if !is_origin {
            errors.push(ValidationError::InvalidPublicOrigin(origin.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let http = matches!(url.scheme(), "http" | "https");
    (http && url.host_str().is_some()).then_some(url)
}
