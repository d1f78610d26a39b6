//! Observability for the Nodes classroom graph.
//!
//! Currently this is logging only: a tracing subscriber with an env filter
//! and either pretty or JSON output.

pub mod logging;

pub use logging::{init_logging, LogExt, LoggingConfig};
