//! HTTP transport implementation using hyper-util.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use tracing::debug;

use crate::{
    FailureKind, Request, Response, TransportError,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
    middleware::LoggingLayer,
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased transport service for middleware composition.
pub type BoxedService = BoxCloneService<Request, Response, TransportError>;

/// Future type for the Tower Service implementation.
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'static>>;

/// Makes a [`BoxedService`] `Sync`, as the [`Transport`](crate::Transport)
/// trait requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        // Clone under the lock, call outside it
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Transport
// ============================================================================

/// Pooled hyper client, before any middleware.
#[derive(Clone)]
struct RawHyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawHyperTransport {
    fn new(config: ClientConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let method = request.method();
        let (url, headers) = request.into_parts();

        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder.body(Full::default()).map_err(|err| {
            debug!(error = %err, "request rejected before sending");
            FailureKind::BadUrl.into()
        })
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        tokio::time::timeout(self.config.timeout, self.exchange(request))
            .await
            .map_err(|_| TransportError::from(FailureKind::TimedOut))?
    }

    async fn exchange(&self, request: Request) -> Result<Response, TransportError> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        // A body that stops mid-stream means the connection went away
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| {
                debug!(error = %err, "failed to read response body");
                TransportError::from(FailureKind::NetworkConnectionLost)
            })?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }
}

impl Service<Request> for RawHyperTransport {
    type Response = Response;
    type Error = TransportError;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

// ============================================================================
// Error Classification
// ============================================================================

#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> TransportError {
    let kind = classify_failure(&err, err.is_connect());
    debug!(error = %err, ?kind, "transport failure");
    kind.map_or_else(|| TransportError::unclassified(err.to_string()), Into::into)
}

/// Classify a failure by walking its source chain.
fn classify_failure(err: &(dyn StdError + 'static), is_connect: bool) -> Option<FailureKind> {
    let mut messages = String::new();
    let mut io_kind = None;
    let mut tls = false;

    let mut current = Some(err);
    while let Some(error) = current {
        messages.push_str(&error.to_string().to_lowercase());
        messages.push(' ');

        if let Some(io_error) = error.downcast_ref::<io::Error>() {
            io_kind.get_or_insert(io_error.kind());
            tls |= io_error
                .get_ref()
                .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some());
        }
        tls |= error.downcast_ref::<rustls::Error>().is_some();

        current = error.source();
    }

    if messages.contains("dns error") {
        return Some(FailureKind::CannotFindHost);
    }
    if tls || messages.contains("certificate") || messages.contains("tls") {
        return Some(FailureKind::SecureConnectionFailed);
    }
    if io_kind == Some(io::ErrorKind::TimedOut) {
        return Some(FailureKind::TimedOut);
    }
    if is_connect {
        return Some(FailureKind::CannotConnectToHost);
    }
    match io_kind {
        Some(
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof,
        ) => Some(FailureKind::NetworkConnectionLost),
        _ if messages.contains("connection closed") || messages.contains("incomplete message") => {
            Some(FailureKind::NetworkConnectionLost)
        }
        _ => None,
    }
}

// ============================================================================
// Public Transport
// ============================================================================

/// HTTP transport using hyper-util with connection pooling, TLS, and
/// middleware support.
///
/// Cloning is cheap and shares the connection pool, so one instance can serve
/// a whole process.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, HyperTransport};
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
/// let client = Client::new(transport);
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperTransport::new(config.clone());
        Self {
            service: SyncService::new(BoxCloneService::new(raw)),
            config,
        }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl courier_core::Transport for HyperTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.service.call(request).await
    }
}

impl Service<Request> for HyperTransport {
    type Response = Response;
    type Error = TransportError;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`HyperTransport`].
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the exchange timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Add a Tower layer around the transport.
    ///
    /// Layers are applied in order: first added = innermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = TransportError>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperTransport::new(config.clone()));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperTransport {
            service: SyncService::new(service),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    /// Error with an optional source, for chain classification.
    #[derive(Debug)]
    struct Chained {
        message: &'static str,
        source: Option<Box<dyn StdError + 'static>>,
    }

    impl fmt::Display for Chained {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Chained {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref()
        }
    }

    fn chained(message: &'static str, source: io::Error) -> Chained {
        Chained {
            message,
            source: Some(Box::new(source)),
        }
    }

    #[test]
    fn transport_default() {
        let transport = HyperTransport::new();
        assert_eq!(transport.config().timeout, Duration::from_secs(60));
    }

    #[test]
    fn transport_builder() {
        let transport = HyperTransport::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .with_logging()
            .build();

        assert_eq!(transport.config().timeout, Duration::from_secs(5));
        assert_eq!(transport.config().pool_idle_per_host, 16);
    }

    #[test]
    fn transport_is_debug() {
        let debug = format!("{:?}", HyperTransport::new());
        assert!(debug.contains("HyperTransport"));
    }

    #[test]
    fn classify_dns_failure() {
        let err = chained(
            "dns error",
            io::Error::other("failed to lookup address information"),
        );
        assert_eq!(
            classify_failure(&err, true),
            Some(FailureKind::CannotFindHost)
        );
    }

    #[test]
    fn classify_refused_connection() {
        let err = chained(
            "tcp connect error",
            io::Error::from(io::ErrorKind::ConnectionRefused),
        );
        assert_eq!(
            classify_failure(&err, true),
            Some(FailureKind::CannotConnectToHost)
        );
    }

    #[test]
    fn classify_connect_timeout() {
        let err = chained("tcp connect error", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(classify_failure(&err, true), Some(FailureKind::TimedOut));
    }

    #[test]
    fn classify_tls_failure() {
        let err = chained(
            "client error",
            io::Error::new(
                io::ErrorKind::InvalidData,
                rustls::Error::General("bad handshake".to_string()),
            ),
        );
        assert_eq!(
            classify_failure(&err, false),
            Some(FailureKind::SecureConnectionFailed)
        );
    }

    #[test]
    fn classify_reset_connection() {
        let err = chained(
            "client error (SendRequest)",
            io::Error::from(io::ErrorKind::ConnectionReset),
        );
        assert_eq!(
            classify_failure(&err, false),
            Some(FailureKind::NetworkConnectionLost)
        );
    }

    #[test]
    fn classify_unknown_failure() {
        let err = chained("client error", io::Error::other("mystery"));
        assert_eq!(classify_failure(&err, false), None);
    }
}
