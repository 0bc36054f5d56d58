//! The batch processor which buffers emitted records and hands them to an exporter in batches
//! from a dedicated worker thread.
//!
//! This is the SDK's [`BatchLogProcessor`]: `emit` only enqueues, records are dropped (and
//! counted) when the queue is full, and a worker exports when a full batch is queued, when the
//! scheduled delay elapses, on `force_flush` and on `shutdown`. [`BatchConfigBuilder::default()`]
//! reads the standard `OTEL_BLRP_*` environment variables; values set on the builder win.

use opentelemetry_sdk::logs::LogExporter;

pub use opentelemetry_sdk::logs::{BatchConfig, BatchConfigBuilder, BatchLogProcessor};

/// Create a batch processor exporting to `exporter`.
#[must_use]
pub fn batch_processor<E: LogExporter + 'static>(exporter: E, config: BatchConfig) -> BatchLogProcessor {
    BatchLogProcessor::builder(exporter)
        .with_batch_config(config)
        .build()
}
