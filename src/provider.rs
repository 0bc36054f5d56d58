use std::{
    borrow::Cow,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use opentelemetry::logs::LoggerProvider as _;
use opentelemetry_sdk::{
    Resource,
    logs::{LogProcessor, SdkLogger, SdkLoggerProvider},
};

use crate::ShutdownError;

/// Owns the resource and the processor; hands out loggers whose records are tagged with the
/// resource and forwarded to the processor.
#[derive(Debug)]
pub struct LoggerProvider {
    inner: SdkLoggerProvider,
    resource: Resource,
    is_shutdown: AtomicBool,
}

static GLOBAL_LOGGER_PROVIDER: RwLock<Option<Arc<LoggerProvider>>> = RwLock::new(None);

impl LoggerProvider {
    /// Create a provider exporting through `processor`.
    pub fn new<P: LogProcessor + 'static>(resource: Resource, processor: P) -> Self {
        let inner = SdkLoggerProvider::builder()
            .with_resource(resource.clone())
            .with_log_processor(processor)
            .build();
        Self {
            inner,
            resource,
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Get a logger whose records carry `name` as their instrumentation scope.
    pub fn logger(&self, name: impl Into<Cow<'static, str>>) -> SdkLogger {
        self.inner.logger(name)
    }

    /// The resource attached to every record of this provider.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Whether [`shutdown`][Self::shutdown] has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Export every buffered record now.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor failed to export.
    pub fn force_flush(&self) -> Result<(), ShutdownError> {
        self.inner.force_flush()?;
        Ok(())
    }

    /// Flush buffered records and shut the processor and exporter down.
    ///
    /// Only the first call does any work; later calls return `Ok(())`. If this provider is the
    /// global logger provider, the global slot is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor failed to flush or shut down in time.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        {
            let mut global = GLOBAL_LOGGER_PROVIDER
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if global
                .as_ref()
                .is_some_and(|provider| std::ptr::eq(Arc::as_ptr(provider), self))
            {
                *global = None;
            }
        }

        self.inner.shutdown()?;
        Ok(())
    }
}

/// Register `provider` as the process-wide logger provider.
///
/// Returns the previously registered provider, if any.
pub fn set_global_logger_provider(provider: Arc<LoggerProvider>) -> Option<Arc<LoggerProvider>> {
    GLOBAL_LOGGER_PROVIDER
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .replace(provider)
}

/// The process-wide logger provider, if one is registered and has not been shut down.
#[must_use]
pub fn global_logger_provider() -> Option<Arc<LoggerProvider>> {
    GLOBAL_LOGGER_PROVIDER
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}
