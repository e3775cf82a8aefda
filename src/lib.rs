//! Transparent reverse proxy that serves a single fixed upstream application
//! from the proxy's own origin.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::UpstreamTarget;
