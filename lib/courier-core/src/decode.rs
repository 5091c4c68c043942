//! Body decoding.
//!
//! A [`Decoder`] turns response bytes into a typed value. Failures are
//! reported as a [`DecoderFailure`], whose [`DecoderFailure::Decode`] arm
//! carries a structured [`DecodeError`]: a category, the field path that
//! failed and a description.
//!
//! Two decoders ship with the crate:
//! - [`JsonDecoder`] (the default) for `application/json` bodies
//! - [`FormDecoder`] for `application/x-www-form-urlencoded` bodies

use std::fmt;

use derive_more::{Display, Error, From};
use serde::de::DeserializeOwned;

use crate::ClientError;

// ============================================================================
// Decoder Trait
// ============================================================================

/// Trait for decoding response bodies into typed values.
///
/// # Example
///
/// ```
/// use courier_core::{Decoder, DecoderFailure, DecodeError, DecodeErrorKind};
/// use serde::de::DeserializeOwned;
///
/// /// Decodes plain-text bodies as JSON strings.
/// struct TextDecoder;
///
/// impl Decoder for TextDecoder {
///     fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecoderFailure> {
///         let text = std::str::from_utf8(bytes).map_err(|e| {
///             DecodeError::new(DecodeErrorKind::DataCorrupted, e.to_string())
///         })?;
///         courier_core::JsonDecoder.decode(serde_json::to_string(text).unwrap().as_bytes())
///     }
/// }
///
/// let text: String = TextDecoder.decode(b"hello").unwrap();
/// assert_eq!(text, "hello");
/// ```
pub trait Decoder: Send + Sync {
    /// Decode `bytes` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecoderFailure`] if the bytes do not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecoderFailure>;
}

// ============================================================================
// Decode Failures
// ============================================================================

/// Failure reported by a [`Decoder`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum DecoderFailure {
    /// The bytes did not match the target type.
    #[display("{_0}")]
    Decode(DecodeError),

    /// An already mapped client error.
    #[display("{_0}")]
    Client(ClientError),

    /// Anything the decoder could not classify.
    #[display("{_0}")]
    #[from(skip)]
    Other(#[error(not(source))] String),
}

/// Structural category of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// Malformed input, or a value outside what the type accepts.
    DataCorrupted,
    /// A required key was absent.
    KeyNotFound {
        /// Missing key.
        key: String,
    },
    /// A value had the wrong type.
    TypeMismatch {
        /// What the type expected.
        expected: String,
    },
    /// A non-optional value was null.
    ValueNotFound {
        /// What the type expected.
        expected: String,
    },
    /// A failure none of the other categories describe.
    Unclassified,
}

/// One step in the path to the failing field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Struct field or map key.
    Field(String),
    /// Sequence index.
    Index(usize),
    /// Enum variant.
    Variant(String),
    /// A step the decoder could not name.
    Unknown,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) | Self::Variant(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
            Self::Unknown => f.write_str("?"),
        }
    }
}

/// Structured decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{summary}")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: Vec<PathSegment>,
    summary: String,
    description: String,
}

impl DecodeError {
    /// Creates a decode error at the root with `message` as both summary
    /// and description.
    #[must_use]
    pub fn new(kind: DecodeErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind,
            path: Vec::new(),
            summary: message.clone(),
            description: message,
        }
    }

    /// Sets the path to the failing field, root first.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Sets the detailed description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Structural category.
    #[must_use]
    pub const fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Path to the failing field, root first.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Short summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Detailed description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Path rendered root to leaf, e.g. `user -> address -> city`.
    #[must_use]
    pub fn rendered_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

const CORRUPTED_PREFIXES: [&str; 5] = [
    "invalid value: ",
    "invalid length ",
    "unknown variant ",
    "unknown field ",
    "duplicate field ",
];

/// Classify a serde error message into a [`DecodeErrorKind`].
///
/// Relies on the wording of the default `serde::de::Error` constructors.
#[must_use]
pub fn classify_message(message: &str) -> DecodeErrorKind {
    if let Some(rest) = message.strip_prefix("missing field `") {
        let key = rest.split('`').next().unwrap_or_default();
        return DecodeErrorKind::KeyNotFound {
            key: key.to_string(),
        };
    }

    if let Some(rest) = message.strip_prefix("invalid type: ") {
        let (found, expected) = rest.split_once(", expected ").unwrap_or((rest, ""));
        let expected = expected.to_string();
        return if found == "null" || found == "unit value" {
            DecodeErrorKind::ValueNotFound { expected }
        } else {
            DecodeErrorKind::TypeMismatch { expected }
        };
    }

    if CORRUPTED_PREFIXES.iter().any(|prefix| message.starts_with(prefix)) {
        return DecodeErrorKind::DataCorrupted;
    }

    DecodeErrorKind::Unclassified
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with path-aware errors.
///
/// Uses `serde_path_to_error` to record the field chain that failed.
///
/// # Example
///
/// ```
/// use courier_core::{Decoder, JsonDecoder};
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = JsonDecoder.decode(br#"{"name":"Alice"}"#).unwrap();
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecoderFailure> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let value: T = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| DecoderFailure::Decode(json_decode_error(&e)))?;
        deserializer
            .end()
            .map_err(|e| DecoderFailure::Decode(json_error(&e, Vec::new())))?;
        Ok(value)
    }
}

fn json_decode_error(error: &serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = error
        .path()
        .iter()
        .map(|segment| match segment {
            serde_path_to_error::Segment::Seq { index } => PathSegment::Index(*index),
            serde_path_to_error::Segment::Map { key } => PathSegment::Field(key.clone()),
            serde_path_to_error::Segment::Enum { variant } => PathSegment::Variant(variant.clone()),
            _ => PathSegment::Unknown,
        })
        .collect();
    json_error(error.inner(), path)
}

fn json_error(error: &serde_json::Error, path: Vec<PathSegment>) -> DecodeError {
    let summary = error.to_string();
    let message = if error.line() == 0 {
        summary.clone()
    } else {
        summary
            .rsplit_once(" at line ")
            .map_or_else(|| summary.clone(), |(message, _)| message.to_string())
    };

    let kind = match error.classify() {
        // Custom `de::Error::custom` messages reject the data itself
        serde_json::error::Category::Data => match classify_message(&message) {
            DecodeErrorKind::Unclassified => DecodeErrorKind::DataCorrupted,
            kind => kind,
        },
        serde_json::error::Category::Syntax
        | serde_json::error::Category::Eof
        | serde_json::error::Category::Io => DecodeErrorKind::DataCorrupted,
    };

    DecodeError::new(kind, summary)
        .with_description(message)
        .with_path(path)
}

// ============================================================================
// Form Decoder
// ============================================================================

/// Decoder for `application/x-www-form-urlencoded` bodies.
///
/// # Example
///
/// ```
/// use courier_core::{Decoder, FormDecoder};
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Token { access_token: String, expires_in: u32 }
///
/// let token: Token = FormDecoder.decode(b"access_token=abc&expires_in=60").unwrap();
/// assert_eq!(token.expires_in, 60);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormDecoder;

impl Decoder for FormDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecoderFailure> {
        serde_urlencoded::from_bytes(bytes).map_err(|e| {
            let message = e.to_string();
            DecoderFailure::Decode(DecodeError::new(classify_message(&message), message))
        })
    }
}
