//! Exporters which receive batches of log records from the batch processor.
//!
//! Any [`opentelemetry_sdk::logs::LogExporter`] can be plugged in with
//! [`BridgeConfigBuilder::with_exporter`][crate::config::BridgeConfigBuilder::with_exporter];
//! without one, records go to the [`ConsoleLogExporter`].

pub use crate::internal::exporters::console::ConsoleLogExporter;
