//! The fixed upstream target.

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

/// Error building an [`UpstreamTarget`].
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid upstream URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("upstream URL {0} has no host")]
    MissingHost(String),

    #[error("upstream origin {0} is not a valid header value")]
    InvalidOrigin(String),
}

/// Base URL of the single upstream application plus the values derived from it.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base: Url,
    origin: String,
    origin_header: HeaderValue,
    referer_header: HeaderValue,
    entry_marker: Option<String>,
}

impl UpstreamTarget {
    /// Create a target from an absolute base URL, with no entry marker.
    pub fn new(base: Url) -> Result<Self, TargetError> {
        if base.host_str().is_none() {
            return Err(TargetError::MissingHost(base.to_string()));
        }

        let origin = base.origin().ascii_serialization();
        let origin_header = HeaderValue::from_str(&origin)
            .map_err(|_| TargetError::InvalidOrigin(origin.clone()))?;
        let referer_header = HeaderValue::from_str(&format!("{}/", origin))
            .map_err(|_| TargetError::InvalidOrigin(origin.clone()))?;

        Ok(Self {
            base,
            origin,
            origin_header,
            referer_header,
            entry_marker: None,
        })
    }

    /// Set the path segment redirect rewriting strips through. Empty disables it.
    pub fn with_entry_marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        self.entry_marker = (!marker.is_empty()).then_some(marker);
        self
    }

    /// Build the target described by the `[upstream]` config section.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, TargetError> {
        let base = Url::parse(config.target.trim())?;
        Ok(Self::new(base)?.with_entry_marker(config.entry_marker.clone()))
    }

    /// Base URL requests are mapped onto.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// ASCII serialization of the upstream origin, e.g. `https://script.google.com`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Value sent upstream as `origin`.
    pub fn origin_header(&self) -> &HeaderValue {
        &self.origin_header
    }

    /// Value sent upstream as `referer`: the origin with a trailing slash.
    pub fn referer_header(&self) -> &HeaderValue {
        &self.referer_header
    }

    pub fn entry_marker(&self) -> Option<&str> {
        self.entry_marker.as_deref()
    }

    /// True when `url` points at the same host and effective port as the target.
    pub fn is_same_host(&self, url: &Url) -> bool {
        url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> UpstreamTarget {
        UpstreamTarget::new(Url::parse("https://script.google.com/macros/s/XYZ/exec").unwrap())
            .unwrap()
    }

    #[test]
    fn test_origin_and_referer() {
        let t = target();
        assert_eq!(t.origin(), "https://script.google.com");
        assert_eq!(t.origin_header(), "https://script.google.com");
        assert_eq!(t.referer_header(), "https://script.google.com/");
    }

    #[test]
    fn test_same_host_accounts_for_port() {
        let t = target();
        assert!(t.is_same_host(&Url::parse("https://script.google.com/other").unwrap()));
        assert!(t.is_same_host(&Url::parse("https://script.google.com:443/x").unwrap()));
        assert!(!t.is_same_host(&Url::parse("https://script.google.com:8443/x").unwrap()));
        assert!(!t.is_same_host(&Url::parse("https://accounts.google.com/").unwrap()));
    }

    #[test]
    fn test_from_config() {
        let mut config = UpstreamConfig::default();
        config.target = "http://127.0.0.1:3000/app/exec".into();
        let t = UpstreamTarget::from_config(&config).unwrap();
        assert_eq!(t.origin(), "http://127.0.0.1:3000");
        assert_eq!(t.entry_marker(), Some("/exec"));

        config.entry_marker = String::new();
        let t = UpstreamTarget::from_config(&config).unwrap();
        assert_eq!(t.entry_marker(), None);
    }

    #[test]
    fn test_rejects_hostless_url() {
        let err = UpstreamTarget::new(Url::parse("data:text/plain,hi").unwrap()).unwrap_err();
        assert!(matches!(err, TargetError::MissingHost(_)));
    }
}
