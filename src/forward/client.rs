//! Outbound HTTP(S) dispatch.
//!
//! One call to [`Dispatch::send`] is one hop: build the request, wait for
//! the response head, then buffer the response body.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{ForwardConfig, TimeoutConfig};
use crate::forward::body::BodyCollector;
use crate::forward::error::{ProxyError, Result, Stage};
use crate::forward::types::{ForwardRequest, ForwardResponse, TargetUrl};
use crate::resilience::timeouts::with_deadline;

/// Sends a single request to a single URL.
pub trait Dispatch: Send + Sync {
    fn send(
        &self,
        url: &TargetUrl,
        req: &ForwardRequest,
    ) -> impl Future<Output = Result<ForwardResponse>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Plain,
    Secure,
}

/// Scheme to transport, fixed at compile time.
const TRANSPORTS: [(&str, Transport); 2] = [("http", Transport::Plain), ("https", Transport::Secure)];

impl Transport {
    fn for_scheme(scheme: &str) -> Option<Self> {
        TRANSPORTS
            .iter()
            .find(|(name, _)| *name == scheme)
            .map(|(_, transport)| *transport)
    }
}

/// Deadlines and limits applied to every hop.
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub body_timeout: Duration,
    pub max_body_bytes: Option<usize>,
}

impl ClientSettings {
    pub fn from_config(timeouts: &TimeoutConfig, forward: &ForwardConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(timeouts.connect_secs),
            response_timeout: Duration::from_secs(timeouts.response_secs),
            body_timeout: Duration::from_secs(timeouts.body_secs),
            max_body_bytes: forward.max_body_bytes,
        }
    }
}

/// hyper-util backed client holding one pool per transport.
#[derive(Clone)]
pub struct OutboundClient {
    plain: Client<HttpConnector, Body>,
    secure: Client<HttpsConnector<HttpConnector>, Body>,
    settings: ClientSettings,
    collector: BodyCollector,
}

impl OutboundClient {
    pub fn new(settings: ClientSettings) -> io::Result<Self> {
        let mut http = HttpConnector::new();
        http.set_connect_timeout(Some(settings.connect_timeout));
        let plain = Client::builder(TokioExecutor::new()).build(http);

        let mut tcp = HttpConnector::new();
        tcp.enforce_http(false);
        tcp.set_connect_timeout(Some(settings.connect_timeout));
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(Arc::new(rustls::crypto::ring::default_provider()))
            .map_err(io::Error::other)?
            .https_only()
            .enable_http1()
            .wrap_connector(tcp);
        let secure = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            plain,
            secure,
            settings,
            collector: BodyCollector::new(settings.max_body_bytes),
        })
    }

    fn build_request(url: &TargetUrl, uri: Uri, req: &ForwardRequest) -> Result<Request<Body>> {
        let mut builder = Request::builder().method(req.method.clone()).uri(uri);

        // Host comes from the target authority, never from the inbound call.
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in req.headers.iter() {
                if name == header::HOST {
                    continue;
                }
                headers.append(name.clone(), value.clone());
            }
        }

        let body = if req.body.is_empty() {
            Body::empty()
        } else {
            Body::from(req.body.clone())
        };

        builder
            .body(body)
            .map_err(|e| ProxyError::dispatch(url.as_str(), &e))
    }
}

impl Dispatch for OutboundClient {
    async fn send(&self, url: &TargetUrl, req: &ForwardRequest) -> Result<ForwardResponse> {
        let parsed = url.parse()?;
        let transport = Transport::for_scheme(parsed.scheme()).ok_or_else(|| ProxyError::Dispatch {
            url: url.to_string(),
            reason: format!("unsupported protocol \"{}:\"", parsed.scheme()),
        })?;
        let uri: Uri = parsed
            .as_str()
            .parse()
            .map_err(|e| ProxyError::dispatch(url.as_str(), &e))?;

        let request = Self::build_request(url, uri, req)?;

        tracing::debug!(
            url = %url,
            method = %req.method,
            transport = ?transport,
            body_len = req.body.len(),
            "Dispatching upstream request"
        );

        let response = with_deadline(Stage::UpstreamResponse, self.settings.response_timeout, async {
            let sent = match transport {
                Transport::Plain => self.plain.request(request).await,
                Transport::Secure => self.secure.request(request).await,
            };
            sent.map_err(|e| ProxyError::dispatch(url.as_str(), &e))
        })
        .await?;

        let (parts, incoming) = response.into_parts();
        let body = with_deadline(Stage::UpstreamBody, self.settings.body_timeout, async {
            self.collector
                .collect(incoming)
                .await
                .map_err(|e| ProxyError::dispatch(url.as_str(), &e))
        })
        .await?;

        tracing::debug!(
            url = %url,
            status = %parts.status,
            body_len = body.len(),
            "Upstream response received"
        );

        Ok(ForwardResponse {
            status: parts.status,
            headers: parts.headers,
            body,
            final_url: url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method};

    #[test]
    fn test_transport_table() {
        assert_eq!(Transport::for_scheme("http"), Some(Transport::Plain));
        assert_eq!(Transport::for_scheme("https"), Some(Transport::Secure));
        assert_eq!(Transport::for_scheme("ftp"), None);
    }

    #[test]
    fn test_build_request_strips_host_and_keeps_duplicates() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        let req = ForwardRequest::new(Method::POST, headers, Bytes::from_static(b"payload"));

        let url = TargetUrl::new("http://upstream.test/x");
        let uri: Uri = "http://upstream.test/x".parse().unwrap();
        let built = OutboundClient::build_request(&url, uri, &req).unwrap();

        assert_eq!(built.method(), Method::POST);
        assert!(built.headers().get(header::HOST).is_none());
        let tags: Vec<_> = built.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    fn test_client() -> OutboundClient {
        OutboundClient::new(ClientSettings::from_config(
            &TimeoutConfig::default(),
            &ForwardConfig::default(),
        ))
        .unwrap()
    }

    // Bind then drop so the port is very likely closed.
    fn closed_addr() -> std::net::SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_dispatch_error() {
        let client = test_client();
        let req = ForwardRequest::new(Method::GET, HeaderMap::new(), Bytes::new());

        let err = client
            .send(&TargetUrl::new("file:///etc/passwd"), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Dispatch { .. }));

        let err = client
            .send(&TargetUrl::new("ftp://example.com/file"), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Dispatch { .. }));
        assert!(err.to_string().contains("unsupported protocol \"ftp:\""), "got {err}");
    }

    #[tokio::test]
    async fn test_connection_refused_is_dispatch_error() {
        let client = test_client();
        let req = ForwardRequest::new(Method::GET, HeaderMap::new(), Bytes::new());
        let err = client
            .send(&TargetUrl::new(format!("http://{}/", closed_addr())), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Dispatch { .. }), "got {err}");
    }

    #[tokio::test]
    async fn test_https_transport_connection_refused_is_dispatch_error() {
        let client = test_client();
        let req = ForwardRequest::new(Method::GET, HeaderMap::new(), Bytes::new());
        let err = client
            .send(&TargetUrl::new(format!("https://{}/", closed_addr())), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Dispatch { .. }), "got {err}");
        assert!(err.to_string().starts_with("https://127.0.0.1:"), "got {err}");
    }
}
