//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Client, ClientError, Decoder, FormDecoder, GetClient, JsonDecoder, Result, Transport,
    UrlComponents,
};
