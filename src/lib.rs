//! # OpenTelemetry log bridge
//!
//! This crate bridges leveled, structured application log calls into a batching
//! OpenTelemetry log pipeline. Every record is tagged with a [`Resource`][opentelemetry_sdk::Resource]
//! describing the running process (service name, version and deployment environment).
//!
//! The most important API is [`configure()`], which builds the pipeline:
//!
//! 1. a resource descriptor (see [`resource::build_resource`]),
//! 2. an exporter writing records to the console (see [`exporters`]),
//! 3. a [`BatchLogProcessor`][processor::BatchLogProcessor] buffering records on a background thread,
//! 4. a [`LoggerProvider`] owning the resource and processor,
//! 5. an [`OtelHandler`] translating [`Record`]s into OpenTelemetry log records.
//!
//! Application code then logs through a [`Logger`], and shuts the pipeline down through a
//! [`ShutdownGuard`] before exiting so that buffered records are flushed.
//!
//! ```rust
//! use otel_log_bridge::{Attr, configure};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (logger, guard) = configure()
//!         .local()
//!         .with_service_name("my-service")
//!         .finish()?
//!         .into_parts();
//!
//!     logger.info("Hello world", [Attr::new("user", "alice")]);
//!
//!     guard.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Identity values which are not set on the builder are read from `OTEL_SERVICE_NAME`,
//! `SERVICE_VERSION` and `DEPLOYMENT_ENVIRONMENT`. Batching can be tuned with the standard
//! `OTEL_BLRP_*` environment variables, see [`processor::BatchConfigBuilder`].

use thiserror::Error;

use crate::config::BridgeConfigBuilder;

mod bridges;
pub mod config;
pub mod exporters;
mod internal;
mod logger;
pub mod processor;
mod provider;
mod record;
pub mod resource;
mod telemetry;

pub use crate::bridges::handler::{Handler, OtelHandler};
pub use crate::bridges::log::LogBridge;
pub use crate::logger::Logger;
pub use crate::provider::{LoggerProvider, global_logger_provider, set_global_logger_provider};
pub use crate::record::{Attr, Level, Record, Value};
pub use crate::telemetry::{ShutdownGuard, Telemetry};

/// An error which may arise when configuring the log bridge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigureError {
    /// The bridge has already been installed globally.
    #[error("The log bridge has already been configured")]
    AlreadyConfigured,

    /// Error configuring the `log::logger`.
    #[error("Error configuring the global logger: {0}")]
    Logging(#[from] log::SetLoggerError),

    /// A configuration value (from environment) was invalid.
    #[error("Invalid configuration value for {parameter}: {value}")]
    InvalidConfigurationValue {
        /// The name of the configuration parameter.
        parameter: &'static str,
        /// The invalid value passed for the parameter.
        value: String,
    },

    /// Any other error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An error which may arise when shutting down the log pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShutdownError {
    /// The opentelemetry SDK failed to shut down.
    #[error("Failed to shutdown Otel SDK: {0}")]
    OtelError(#[from] opentelemetry_sdk::error::OTelSdkError),
}

/// An error returned by a [`Handler`] which could not handle a record.
#[derive(Debug, Error)]
#[error("Failed to handle log record: {0}")]
pub struct HandleError(pub Box<dyn std::error::Error + Send + Sync>);

/// Main entry point to configure the log bridge.
///
/// This should be called once at the start of the program.
///
/// See [`BridgeConfigBuilder`] for the full set of configuration options.
pub fn configure() -> BridgeConfigBuilder {
    BridgeConfigBuilder::default()
}

#[cfg(test)]
mod test_utils;
