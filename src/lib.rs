/// Core message plumbing: envelopes, frames, filters, subscriptions.
pub mod bus;
/// Client façade: emit/on/off/lock over a router capability.
pub mod client;
/// Client configuration and environment-backed settings.
pub mod config;
/// Common error types: bus runtime errors, configuration errors.
pub mod error;
/// Distributed lock protocol: pending table, pre-installed filters, arbiter.
pub mod lock;
/// Logging setup (tracing subscriber, env-filter).
pub mod logging;
/// Router capability trait and in-process implementations.
pub mod router;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Reserved `!sys.*` channels and their wire payloads.
pub use bus::sys;
/// Wire unit, frame and filter/subscription surface.
pub use bus::{
    filter_fn, handler_fn, Envelope, Filter, FilterResult, FnFilter, FnHandler, Frame, Handler,
    SubscriptionId, Verdict,
};
/// The bus client.
pub use client::Client;
/// Configuration.
pub use config::{ClientConfig, Settings};
/// Operation errors and result aliases.
pub use error::{BusError, BusResult, ConfigError};
/// Lock protocol surface.
pub use lock::{LockArbiter, Unlock};
/// Logging.
pub use logging::{init_logging, LoggingConfig};
/// Router capability and in-process transports.
pub use router::{InMemoryHub, InMemoryRouter, MessageCallback, MockRouter, Router};
