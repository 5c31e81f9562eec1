//! Single-endpoint HTTP forwarding proxy.
//!
//! A caller names a target with the `url` query parameter; the proxy replays
//! the call's method, headers and body against it, follows redirects itself
//! and relays the terminal response byte for byte.

pub mod config;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
