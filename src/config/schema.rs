//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::forward::redirect::DEFAULT_MAX_REDIRECTS;

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarding engine settings.
    pub forward: ForwardConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admission control.
    pub rate_limit: RateLimitConfig,

    /// Response header policy.
    pub headers: HeaderPolicyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Forwarding engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Redirects followed per call before giving up.
    pub max_redirects: u32,

    /// Cap on inbound and upstream bodies. Unbounded when absent.
    pub max_body_bytes: Option<usize>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: None,
        }
    }
}

/// Timeout configuration for each suspension point.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Wait for the upstream response head, per hop, in seconds.
    pub response_secs: u64,

    /// Wait for a complete body (inbound or upstream) in seconds.
    pub body_secs: u64,

    /// Whole inbound call in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 30,
            body_secs: 30,
            request_secs: 120,
        }
    }
}

/// Who shares a rate-limit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One counter for the whole process.
    Global,
    /// One counter per client IP.
    PerClient,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per window.
    pub max_requests: u64,

    /// Window length in seconds.
    pub window_secs: u64,

    pub scope: RateLimitScope,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 1000,
            window_secs: 60 * 60,
            scope: RateLimitScope::Global,
        }
    }
}

/// Response header policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderPolicyConfig {
    /// Add permissive CORS headers to every response.
    pub cors: bool,

    /// Remove `x-powered-by`, `date` and `connection`.
    pub strip_defaults: bool,
}

impl Default for HeaderPolicyConfig {
    fn default() -> Self {
        Self {
            cors: true,
            strip_defaults: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
