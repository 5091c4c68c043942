//! Core types and traits for the courier HTTP GET client.
//!
//! This crate provides the transport-independent pipeline:
//! - [`UrlComponents`] - Structured URL, validated before any I/O
//! - [`Client`] - GET and decode over an injected [`Transport`]
//! - [`ClientError`] and [`Result`] - The four-variant error taxonomy
//! - [`Decoder`], [`JsonDecoder`], [`FormDecoder`] - Pluggable body decoding
//! - [`Transport`], [`Request`], [`Response`], [`TransportError`] - Transport contract
//! - [`status`] - Standard reason phrases
//!
//! The network stack lives behind [`Transport`]; the `courier` crate provides
//! a hyper-based implementation.

mod client;
mod components;
mod decode;
mod error;
pub mod prelude;
pub mod status;
mod transport;

pub use client::{Client, DEFAULT_USER_AGENT, GetClient};
pub use components::{QueryItem, UrlComponents};
pub use decode::{
    DecodeError, DecodeErrorKind, Decoder, DecoderFailure, FormDecoder, JsonDecoder, PathSegment,
    classify_message,
};
pub use error::{ClientError, Result};
pub use transport::{FailureKind, Request, Response, Transport, TransportError};

// Re-export for transports and callers
pub use bytes::Bytes;
pub use url::Url;
