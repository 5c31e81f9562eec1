//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single proxy endpoint
//! - Wire up middleware (access log, header policy, admission)
//! - Bound each call with a deadline covering all of its hops
//! - Bind server to listener
//! - Run each call through decode → collect → resolve → relay

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ProxyConfig;
use crate::forward::{
    target, BodyCollector, ClientSettings, ForwardResponse, OutboundClient, ProxyError,
    RedirectResolver, Stage,
};
use crate::http::request::{into_forward_request, target_param};
use crate::http::response;
use crate::observability::{access_log, metrics};
use crate::resilience::timeouts::with_deadline;
use crate::security::headers;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RedirectResolver<OutboundClient>>,
    pub collector: BodyCollector,
    pub body_timeout: Duration,
    pub call_timeout: Duration,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with its own rate limiter.
    pub fn new(config: ProxyConfig) -> io::Result<Self> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self::with_rate_limiter(config, limiter)
    }

    /// Create a new HTTP server admitting calls through `limiter`.
    pub fn with_rate_limiter(config: ProxyConfig, limiter: Arc<RateLimiter>) -> io::Result<Self> {
        let settings = ClientSettings::from_config(&config.timeouts, &config.forward);
        let client = OutboundClient::new(settings)?;

        let state = AppState {
            resolver: Arc::new(RedirectResolver::new(client, config.forward.max_redirects)),
            collector: BodyCollector::new(config.forward.max_body_bytes),
            body_timeout: settings.body_timeout,
            call_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state, limiter);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let router = Router::new()
            .route("/", any(proxy_handler))
            .with_state(state);

        let router = if config.rate_limit.enabled {
            router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        } else {
            router
        };

        headers::apply(router, &config.headers).layer(access_log::layer())
    }

    /// Router with every layer applied, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_redirects = self.config.forward.max_redirects,
            rate_limited = self.config.rate_limit.enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point: every method, path `/`.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    // Covers decode, inbound body and every redirect hop.
    let outcome = with_deadline(Stage::Call, state.call_timeout, forward(&state, request)).await;

    match outcome {
        Ok(forwarded) => {
            metrics::record_request(method.as_str(), forwarded.status.as_u16(), start_time);
            response::relay(forwarded)
        }
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Forwarding failed");
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), response::FAILURE_STATUS.as_u16(), start_time);
            response::failure(&e)
        }
    }
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<ForwardResponse, ProxyError> {
    let target = target::decode(target_param(request.uri()).as_deref())?;

    tracing::debug!(target = %target, method = %request.method(), "Forwarding");

    let forward_request = into_forward_request(request, &state.collector, state.body_timeout).await?;
    let forwarded = state.resolver.resolve(target, &forward_request).await?;

    tracing::info!(
        final_url = %forwarded.final_url,
        status = %forwarded.status,
        body_len = forwarded.body.len(),
        "Forwarded"
    );

    Ok(forwarded)
}
