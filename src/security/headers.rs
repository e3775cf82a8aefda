//! Outbound request header sanitization.
//!
//! # Responsibilities
//! - Strip headers that identify the proxy's own host or infrastructure
//! - Strip headers the transport recomputes (`content-length`)
//! - Make the request look same-origin to the upstream (`origin`, `referer`)
//!
//! # Design Decisions
//! - Rules are lowercase names and prefixes; `HeaderName`s are already lowercase
//! - Configured rules extend the built-in ones and can never remove them
//! - Every other header is copied value by value, so repeated headers survive

use axum::http::header::{ORIGIN, REFERER};
use axum::http::HeaderMap;

use crate::config::UpstreamConfig;
use crate::upstream::UpstreamTarget;

/// Headers never forwarded, whatever the configuration says.
pub const ALWAYS_STRIPPED_NAMES: [&str; 2] = ["host", "content-length"];

/// Header prefixes never forwarded, whatever the configuration says.
pub const ALWAYS_STRIPPED_PREFIXES: [&str; 2] = ["cf-", "x-forwarded-"];

/// Which inbound headers are withheld from the upstream.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    stripped_names: Vec<String>,
    stripped_prefixes: Vec<String>,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}

impl HeaderPolicy {
    /// Built-in rules plus the given extra names and prefixes.
    pub fn new<N, P>(names: N, prefixes: P) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        fn rules<I>(always: [&str; 2], extra: I) -> Vec<String>
        where
            I: IntoIterator,
            I::Item: AsRef<str>,
        {
            let mut rules: Vec<String> = always.iter().map(|r| r.to_string()).collect();
            for rule in extra {
                let rule = rule.as_ref().trim().to_ascii_lowercase();
                if !rules.contains(&rule) {
                    rules.push(rule);
                }
            }
            rules
        }

        Self {
            stripped_names: rules(ALWAYS_STRIPPED_NAMES, names),
            stripped_prefixes: rules(ALWAYS_STRIPPED_PREFIXES, prefixes),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(&config.strip_headers, &config.strip_header_prefixes)
    }

    /// True if a header with this (lowercase) name must not be forwarded.
    pub fn is_stripped(&self, name: &str) -> bool {
        self.stripped_names.iter().any(|n| n == name)
            || self.stripped_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Produce the header set sent upstream.
    pub fn sanitize(&self, inbound: &HeaderMap, target: &UpstreamTarget) -> HeaderMap {
        let mut outbound = HeaderMap::with_capacity(inbound.len() + 2);
        for (name, value) in inbound.iter() {
            if self.is_stripped(name.as_str()) {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        outbound.insert(ORIGIN, target.origin_header().clone());
        outbound.insert(REFERER, target.referer_header().clone());
        outbound
    }
}
