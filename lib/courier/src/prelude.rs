//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    Client, ClientConfig, ClientError, Decoder, GetClient, HyperTransport, JsonDecoder, Result,
    UrlComponents,
};

// Re-export serde for user-defined response types
pub use serde::Deserialize;
