//! Request client.
//!
//! - [`Client`] - Validates components, runs the transport, classifies the outcome
//! - [`GetClient`] - The client surface as a trait, for substituting fakes

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    ClientError, Decoder, JsonDecoder, Request, Result, Transport, UrlComponents, status,
};

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Client Trait
// ============================================================================

/// The GET-and-decode surface.
///
/// Application code can depend on this trait instead of a concrete
/// [`Client`], then substitute a fake in tests.
pub trait GetClient: Send + Sync {
    /// Fetch the raw body.
    fn get(&self, components: &UrlComponents) -> impl Future<Output = Result<Bytes>> + Send;

    /// Fetch the body and decode it as JSON.
    fn get_and_decode<T>(
        &self,
        components: &UrlComponents,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        self.get_and_decode_with(components, &JsonDecoder)
    }

    /// Fetch the body and decode it with `decoder`.
    fn get_and_decode_with<T, D>(
        &self,
        components: &UrlComponents,
        decoder: &D,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send,
        D: Decoder;
}

// ============================================================================
// Client
// ============================================================================

/// GET client over an injected [`Transport`].
///
/// Holds no mutable state: concurrent calls on the same client are
/// independent. Each call resolves exactly once, in the task that awaits it.
///
/// # Example
///
/// ```ignore
/// use courier_core::{Client, UrlComponents};
///
/// let client = Client::new(transport);
/// let components = UrlComponents::new()
///     .scheme("https")
///     .host("api.example.com")
///     .path("/users/42");
///
/// let user: User = client.get_and_decode(&components).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    default_headers: HashMap<String, String>,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default headers.
    #[must_use]
    pub fn new(transport: T) -> Self {
        let default_headers = HashMap::from([
            ("Accept".to_string(), "*/*".to_string()),
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
        ]);
        Self {
            transport,
            default_headers,
        }
    }

    /// Replace or add a default header sent with every request.
    ///
    /// Header names compare case-insensitively.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.insert(name, value.into());
        self
    }

    /// The injected transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Fetch the raw body.
    ///
    /// Returns the body bytes for a `2xx` response. Invalid components fail
    /// with [`ClientError::InvalidUrl`] before the transport is called.
    pub async fn get(&self, components: &UrlComponents) -> Result<Bytes> {
        let url = components.url().inspect_err(|_| {
            debug!(?components, "rejected URL components");
        })?;

        let request = Request::get(url).headers(self.default_headers.clone());
        let url = request.url().to_string();

        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(%url, error = %err, "transport failed");
            ClientError::from_transport(err)
        })?;

        let Some(code) = response.status().filter(|code| status::is_valid(*code)) else {
            warn!(%url, "response is not an HTTP response");
            return Err(ClientError::Unknown);
        };

        if !status::is_success(code) {
            debug!(%url, status = code, "unsuccessful status");
            return Err(ClientError::from_status(code));
        }

        debug!(%url, status = code, "request succeeded");
        Ok(response.into_body())
    }

    /// Fetch the body and decode it as JSON.
    pub async fn get_and_decode<R>(&self, components: &UrlComponents) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.get_and_decode_with(components, &JsonDecoder).await
    }

    /// Fetch the body and decode it with `decoder`.
    ///
    /// Errors from [`Client::get`] propagate unchanged; decoder failures are
    /// mapped by [`ClientError::from_decoder`].
    pub async fn get_and_decode_with<R, D>(
        &self,
        components: &UrlComponents,
        decoder: &D,
    ) -> Result<R>
    where
        R: DeserializeOwned,
        D: Decoder,
    {
        let body = self.get(components).await?;
        decoder.decode(&body).map_err(|failure| {
            debug!(error = %failure, "failed to decode response body");
            ClientError::from_decoder(failure)
        })
    }
}

impl<T: Transport> GetClient for Client<T> {
    fn get(&self, components: &UrlComponents) -> impl Future<Output = Result<Bytes>> + Send {
        Self::get(self, components)
    }

    fn get_and_decode_with<R, D>(
        &self,
        components: &UrlComponents,
        decoder: &D,
    ) -> impl Future<Output = Result<R>> + Send
    where
        R: DeserializeOwned + Send,
        D: Decoder,
    {
        Self::get_and_decode_with(self, components, decoder)
    }
}
