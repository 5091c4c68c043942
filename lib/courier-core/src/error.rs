//! Error types for courier.
//!
//! Every failure a caller can observe is a [`ClientError`]. It is produced at
//! the failure site from one of three origins, each with its own mapping
//! function:
//!
//! - [`ClientError::from_transport`] for failures reported by the [`Transport`](crate::Transport)
//! - [`ClientError::from_status`] for HTTP responses outside `200..300`
//! - [`ClientError::from_decoder`] for failures reported by a [`Decoder`](crate::Decoder)

use derive_more::{Display, Error};

use crate::decode::{DecodeError, DecodeErrorKind, DecoderFailure};
use crate::transport::TransportError;

/// Error returned by every courier request.
///
/// Variants compare by value, which keeps assertions in tests simple.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ClientError {
    /// The URL components could not produce an absolute URL.
    #[display("invalid URL supplied to client")]
    InvalidUrl,

    /// Non-2xx status code, or a transport failure with a native error code.
    #[display("network error ({code}): {reason}")]
    Network {
        /// HTTP status code or native transport error code.
        code: i64,
        /// Standard reason phrase or transport description.
        reason: String,
    },

    /// The response body did not match the requested type.
    #[display("decoding error: {reason}")]
    Decoding {
        /// Short summary from the decoder.
        reason: String,
        /// Category, field path and expected type or key.
        debug_reason: String,
    },

    /// Any outcome that fits none of the other variants.
    #[display("unknown error occurred while making request")]
    Unknown,
}

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Create a network error from a code and reason.
    #[must_use]
    pub fn network(code: i64, reason: impl Into<String>) -> Self {
        Self::Network {
            code,
            reason: reason.into(),
        }
    }

    /// Create a decoding error from a summary and a diagnostic.
    #[must_use]
    pub fn decoding(reason: impl Into<String>, debug_reason: impl Into<String>) -> Self {
        Self::Decoding {
            reason: reason.into(),
            debug_reason: debug_reason.into(),
        }
    }

    /// Map a failure reported by the transport.
    ///
    /// Natively classified failures keep their code and description;
    /// anything else is [`ClientError::Unknown`].
    #[must_use]
    pub fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::Native { code, description } => Self::Network {
                code,
                reason: description,
            },
            TransportError::Unclassified(_) => Self::Unknown,
        }
    }

    /// Map an HTTP status code outside `200..300`.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self::Network {
            code: i64::from(status),
            reason: crate::status::reason_phrase(status),
        }
    }

    /// Map a failure reported by a decoder.
    #[must_use]
    pub fn from_decoder(failure: DecoderFailure) -> Self {
        match failure {
            DecoderFailure::Decode(error) => Self::from_decode_error(&error),
            DecoderFailure::Client(error) => error,
            DecoderFailure::Other(_) => Self::Unknown,
        }
    }

    fn from_decode_error(error: &DecodeError) -> Self {
        let context = || {
            format!(
                "context: {}, path: {}",
                error.description(),
                error.rendered_path()
            )
        };

        let debug_reason = match error.kind() {
            DecodeErrorKind::DataCorrupted => {
                format!("data is corrupted or otherwise invalid. {}", context())
            }
            DecodeErrorKind::KeyNotFound { key } => format!(
                "a keyed container was asked for an entry it does not contain. key: {key}, {}",
                context()
            ),
            DecodeErrorKind::TypeMismatch { expected } => format!(
                "a value could not be decoded because it did not match the encoded type. type: {expected}, {}",
                context()
            ),
            DecodeErrorKind::ValueNotFound { expected } => format!(
                "a non-optional value was expected, but a null value was found. type: {expected}, {}",
                context()
            ),
            DecodeErrorKind::Unclassified => "new unhandled error".to_string(),
        };

        Self::Decoding {
            reason: error.summary().to_string(),
            debug_reason,
        }
    }

    /// Returns `true` if this is an invalid URL error.
    #[must_use]
    pub const fn is_invalid_url(&self) -> bool {
        matches!(self, Self::InvalidUrl)
    }

    /// Returns `true` if this is a network error.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns `true` if this is a decoding error.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding { .. })
    }

    /// Returns `true` if this is an unknown error.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns the status or native code if this is a network error.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Network { code, .. } => Some(*code),
            _ => None,
        }
    }
}
