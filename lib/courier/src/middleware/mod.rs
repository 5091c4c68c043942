//! Tower middleware for the hyper transport.
//!
//! Layers wrap the transport service and are added through
//! [`HyperTransportBuilder::layer`](crate::HyperTransportBuilder::layer).
//! Any `tower::Layer` whose service speaks
//! `Service<Request, Response = Response, Error = TransportError>` fits.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs exchanges using `tracing`
//!
//! # Example
//!
//! ```ignore
//! use courier::HyperTransport;
//!
//! let transport = HyperTransport::builder()
//!     .with_logging()
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
