//! Minimal async HTTP GET client with typed decoding.
//!
//! Build a URL from [`UrlComponents`], fetch it, and optionally decode the
//! body. Every failure is a [`ClientError`].
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let client = courier::client();
//! let components = UrlComponents::new()
//!     .scheme("https")
//!     .host("api.example.com")
//!     .path("/users/42");
//!
//! let user: User = client.get_and_decode(&components).await?;
//! ```

mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Bytes, Client, ClientError, DEFAULT_USER_AGENT, DecodeError, DecodeErrorKind, Decoder,
    DecoderFailure, FailureKind, FormDecoder, GetClient, JsonDecoder, PathSegment, QueryItem,
    Request, Response, Result, Transport, TransportError, UrlComponents, status,
};

// Re-export url for callers building components from strings
pub use url;

/// Create a client over a [`HyperTransport`] with default configuration.
#[must_use]
pub fn client() -> Client<HyperTransport> {
    Client::new(HyperTransport::new())
}

/// Create a client over a [`HyperTransport`] with custom configuration.
///
/// The configured `User-Agent` replaces [`DEFAULT_USER_AGENT`].
#[must_use]
pub fn client_with_config(config: ClientConfig) -> Client<HyperTransport> {
    let user_agent = config.user_agent.clone();
    Client::new(HyperTransport::with_config(config)).with_default_header("User-Agent", user_agent)
}
