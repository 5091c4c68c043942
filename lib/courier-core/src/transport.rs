//! Transport contract.
//!
//! A [`Transport`] performs the actual HTTP exchange. The core only consumes
//! this contract: it hands over a [`Request`] and receives either a
//! [`Response`] or a [`TransportError`].
//!
//! Implement [`Transport`] to plug in a different network stack, or to
//! substitute a deterministic fake in tests.

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use derive_more::{Display, Error};
use url::Url;

// ============================================================================
// Transport Trait
// ============================================================================

/// Core transport trait.
///
/// Implementations are reusable handles shared by every request of a
/// client, so they must be `Send + Sync`. Connection pooling, if any, lives
/// behind this trait.
pub trait Transport: Send + Sync {
    /// Perform a GET exchange.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response could be obtained:
    /// connection refused, timeout, DNS or TLS failure, connection lost.
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        T::execute(self, request)
    }
}

// ============================================================================
// Request
// ============================================================================

/// A GET request: target URL and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: Url,
    headers: HashMap<String, String>,
}

impl Request {
    /// Creates a request for `url` with no headers.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: HashMap::new(),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// HTTP method, always `GET`.
    #[must_use]
    pub const fn method(&self) -> http::Method {
        http::Method::GET
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn header_map(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Consume into (url, headers).
    #[must_use]
    pub fn into_parts(self) -> (Url, HashMap<String, String>) {
        (self.url, self.headers)
    }
}

// ============================================================================
// Response
// ============================================================================

/// What a transport received.
///
/// `status` is `None` when the exchange produced something that is not an
/// HTTP response (no status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Option<u16>,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Creates an HTTP response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        Self {
            status: Some(status),
            headers,
            body,
        }
    }

    /// Creates a response that carries no HTTP status.
    #[must_use]
    pub fn non_http(body: Bytes) -> Self {
        Self {
            status: None,
            headers: HashMap::new(),
            body,
        }
    }

    /// HTTP status code, if this is an HTTP response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Native failure categories with their error codes.
///
/// The codes are stable and match the values widely used by platform URL
/// loading stacks, so callers that already switch on them keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request target could not be handed to the network stack.
    BadUrl,
    /// No response arrived within the configured timeout.
    TimedOut,
    /// The host name did not resolve.
    CannotFindHost,
    /// The host refused or could not accept the connection.
    CannotConnectToHost,
    /// The connection dropped mid-exchange.
    NetworkConnectionLost,
    /// TLS negotiation failed.
    SecureConnectionFailed,
}

impl FailureKind {
    /// Native error code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::BadUrl => -1000,
            Self::TimedOut => -1001,
            Self::CannotFindHost => -1003,
            Self::CannotConnectToHost => -1004,
            Self::NetworkConnectionLost => -1005,
            Self::SecureConnectionFailed => -1200,
        }
    }

    /// Short lower-case summary.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::BadUrl => "bad URL",
            Self::TimedOut => "request timed out",
            Self::CannotFindHost => "cannot find host",
            Self::CannotConnectToHost => "cannot connect to host",
            Self::NetworkConnectionLost => "network connection lost",
            Self::SecureConnectionFailed => "secure connection failed",
        }
    }

    /// Full human-readable description.
    #[must_use]
    pub fn description(self) -> String {
        format!(
            "The operation couldn't be completed. (courier error {}: {}.)",
            self.code(),
            self.summary()
        )
    }
}

/// Failure reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransportError {
    /// Failure with a native error code.
    #[display("transport error {code}: {description}")]
    Native {
        /// Native error code.
        code: i64,
        /// Human-readable description.
        description: String,
    },

    /// Failure the transport could not classify.
    #[display("unclassified transport error: {_0}")]
    Unclassified(#[error(not(source))] String),
}

impl TransportError {
    /// Create a failure with a native code and description.
    #[must_use]
    pub fn native(code: i64, description: impl Into<String>) -> Self {
        Self::Native {
            code,
            description: description.into(),
        }
    }

    /// Create an unclassified failure.
    #[must_use]
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified(message.into())
    }

    /// Returns the native code, if classified.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Native { code, .. } => Some(*code),
            Self::Unclassified(_) => None,
        }
    }
}

impl From<FailureKind> for TransportError {
    fn from(kind: FailureKind) -> Self {
        Self::native(kind.code(), kind.description())
    }
}
