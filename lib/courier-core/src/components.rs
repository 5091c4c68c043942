//! Structured URL components.
//!
//! [`UrlComponents`] holds a URL before serialization. [`UrlComponents::url`]
//! turns it into an absolute [`Url`], or fails with
//! [`ClientError::InvalidUrl`] when the parts cannot form one.
//!
//! # Example
//!
//! ```
//! use courier_core::UrlComponents;
//!
//! let components = UrlComponents::new()
//!     .scheme("https")
//!     .host("api.example.com")
//!     .path("/users")
//!     .query("page", "1");
//!
//! let url = components.url().unwrap();
//! assert_eq!(url.as_str(), "https://api.example.com/users?page=1");
//! ```

use url::{Url, form_urlencoded};

use crate::{ClientError, Result};

/// A single query item. A `None` value serializes as a bare key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryItem {
    /// Item name.
    pub name: String,
    /// Item value, if any.
    pub value: Option<String>,
}

impl QueryItem {
    /// Creates a query item with a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a query item without a value.
    #[must_use]
    pub fn key_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// URL parts prior to serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UrlComponents {
    /// Scheme, e.g. `https`.
    pub scheme: Option<String>,
    /// Host name or IP address.
    pub host: Option<String>,
    /// Explicit port.
    pub port: Option<u16>,
    /// Path. Must be empty or start with `/`.
    pub path: String,
    /// Query items, serialized in order.
    pub query_items: Vec<QueryItem>,
    /// Fragment, without the leading `#`.
    pub fragment: Option<String>,
}

impl UrlComponents {
    /// Creates empty components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits an existing URL into components.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self {
            scheme: Some(url.scheme().to_string()),
            host: url.host_str().map(str::to_string),
            port: url.port(),
            path: url.path().to_string(),
            query_items: url.query().map(query_items).unwrap_or_default(),
            fragment: url.fragment().map(str::to_string),
        }
    }

    /// Parses a URL string into components.
    pub fn parse(input: &str) -> Result<Self> {
        Url::parse(input)
            .map(|url| Self::from_url(&url))
            .map_err(|_| ClientError::InvalidUrl)
    }

    /// Sets the scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Appends a query item.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_items.push(QueryItem::new(name, value));
        self
    }

    /// Appends a query item without a value.
    #[must_use]
    pub fn query_key(mut self, name: impl Into<String>) -> Self {
        self.query_items.push(QueryItem::key_only(name));
        self
    }

    /// Sets the fragment.
    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Serializes the components into an absolute URL.
    ///
    /// Fails when the scheme or host is missing or malformed, or when a
    /// non-empty path does not start with `/`.
    pub fn url(&self) -> Result<Url> {
        let scheme = self
            .scheme
            .as_deref()
            .filter(|scheme| is_valid_scheme(scheme))
            .ok_or(ClientError::InvalidUrl)?;
        let host = self
            .host
            .as_deref()
            .filter(|host| is_valid_host(host))
            .ok_or(ClientError::InvalidUrl)?;

        if !self.path.is_empty() && !self.path.starts_with('/') {
            return Err(ClientError::InvalidUrl);
        }

        let authority = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };

        let mut url =
            Url::parse(&format!("{scheme}://{authority}")).map_err(|_| ClientError::InvalidUrl)?;
        if url.cannot_be_a_base() || url.host().is_none() {
            return Err(ClientError::InvalidUrl);
        }

        if let Some(port) = self.port {
            url.set_port(Some(port))
                .map_err(|()| ClientError::InvalidUrl)?;
        }
        if !self.path.is_empty() {
            url.set_path(&self.path);
        }
        if !self.query_items.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for item in &self.query_items {
                match &item.value {
                    Some(value) => pairs.append_pair(&item.name, value),
                    None => pairs.append_key_only(&item.name),
                };
            }
        }
        if let Some(fragment) = &self.fragment {
            url.set_fragment(Some(fragment));
        }

        Ok(url)
    }
}

impl TryFrom<&UrlComponents> for Url {
    type Error = ClientError;

    fn try_from(components: &UrlComponents) -> Result<Self> {
        components.url()
    }
}

// A segment without `=` is a bare key, distinct from `key=`
fn query_items(query: &str) -> Vec<QueryItem> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let (name, value) = form_urlencoded::parse(segment.as_bytes()).next()?;
            Some(if segment.contains('=') {
                QueryItem::new(name, value)
            } else {
                QueryItem::key_only(name)
            })
        })
        .collect()
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && !host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google() -> UrlComponents {
        UrlComponents::new().scheme("https").host("www.google.com")
    }

    #[test]
    fn scheme_and_host_only() {
        let url = google().url().expect("valid URL");
        assert_eq!(url.as_str(), "https://www.google.com/");
    }

    #[test]
    fn relative_path_is_invalid() {
        assert_eq!(google().path("foo").url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn absolute_path() {
        let url = google().path("/search").url().expect("valid URL");
        assert_eq!(url.as_str(), "https://www.google.com/search");
    }

    #[test]
    fn missing_scheme_is_invalid() {
        let components = UrlComponents::new().host("www.google.com");
        assert_eq!(components.url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn missing_host_is_invalid() {
        let components = UrlComponents::new().scheme("https").path("/foo");
        assert_eq!(components.url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn empty_host_is_invalid() {
        let components = UrlComponents::new().scheme("https").host("");
        assert_eq!(components.url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn malformed_scheme_is_invalid() {
        assert_eq!(
            google().scheme("1http").url(),
            Err(ClientError::InvalidUrl)
        );
        assert_eq!(
            google().scheme("ht tp").url(),
            Err(ClientError::InvalidUrl)
        );
        assert_eq!(google().scheme("").url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn malformed_host_is_invalid() {
        let components = UrlComponents::new().scheme("https").host("bad host");
        assert_eq!(components.url(), Err(ClientError::InvalidUrl));

        let components = UrlComponents::new().scheme("https").host("a/b");
        assert_eq!(components.url(), Err(ClientError::InvalidUrl));
    }

    #[test]
    fn query_items_keep_order() {
        let url = google()
            .path("/search")
            .query("q", "rust")
            .query_key("verbatim")
            .query("page", "2")
            .url()
            .expect("valid URL");

        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=rust&verbatim&page=2"
        );
    }

    #[test]
    fn query_values_are_encoded() {
        let url = google().query("q", "a&b=c").url().expect("valid URL");
        assert_eq!(url.query(), Some("q=a%26b%3Dc"));
    }

    #[test]
    fn port_and_fragment() {
        let url = UrlComponents::new()
            .scheme("http")
            .host("localhost")
            .port(8080)
            .path("/docs")
            .fragment("intro")
            .url()
            .expect("valid URL");

        assert_eq!(url.as_str(), "http://localhost:8080/docs#intro");
    }

    #[test]
    fn ipv6_host() {
        let url = UrlComponents::new()
            .scheme("http")
            .host("::1")
            .path("/")
            .url()
            .expect("valid URL");

        assert_eq!(url.as_str(), "http://[::1]/");
    }

    #[test]
    fn parse_round_trip() {
        let components =
            UrlComponents::parse("https://api.example.com:8443/users?id=7#top").expect("parse");

        assert_eq!(components.scheme.as_deref(), Some("https"));
        assert_eq!(components.host.as_deref(), Some("api.example.com"));
        assert_eq!(components.port, Some(8443));
        assert_eq!(components.path, "/users");
        assert_eq!(components.query_items, vec![QueryItem::new("id", "7")]);
        assert_eq!(components.fragment.as_deref(), Some("top"));
        assert_eq!(
            components.url().expect("valid URL").as_str(),
            "https://api.example.com:8443/users?id=7#top"
        );
    }

    #[test]
    fn parse_keeps_bare_keys() {
        let components = UrlComponents::parse("https://h/p?flag&x=1&empty=").expect("parse");
        assert_eq!(
            components.query_items,
            vec![
                QueryItem::key_only("flag"),
                QueryItem::new("x", "1"),
                QueryItem::new("empty", ""),
            ]
        );
        assert_eq!(
            components.url().expect("url").as_str(),
            "https://h/p?flag&x=1&empty="
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            UrlComponents::parse("not a url"),
            Err(ClientError::InvalidUrl)
        );
    }
}
