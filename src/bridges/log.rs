use std::collections::HashMap;

use log::{LevelFilter, Metadata};

use crate::{Attr, ConfigureError, Level, Logger, Record, internal::env::get_optional_env};

/// Attribute carrying the `log` target of a bridged record.
const CODE_NAMESPACE: &str = "code.namespace";

/// Forwards records from the [`log`] facade to a [`Logger`].
///
/// Records are filtered with an [`env_filter`] built from `RUST_LOG`, defaulting to `info`.
#[derive(Debug)]
pub struct LogBridge {
    logger: Logger,
    filter: env_filter::Filter,
}

impl LogBridge {
    /// Create a bridge forwarding to `logger`, filtered by `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns an error if `RUST_LOG` is set but not valid UTF-8.
    pub fn new(logger: Logger) -> Result<Self, ConfigureError> {
        Self::with_env(logger, None)
    }

    /// Like [`new`][Self::new], reading `RUST_LOG` from `env` instead of the process
    /// environment when provided.
    pub(crate) fn with_env(
        logger: Logger,
        env: Option<&HashMap<String, String>>,
    ) -> Result<Self, ConfigureError> {
        let mut filter_builder = env_filter::Builder::new();
        if let Some(filter) = get_optional_env("RUST_LOG", env)? {
            filter_builder.parse(&filter);
        } else {
            filter_builder.filter_level(LevelFilter::Info);
        }

        Ok(LogBridge {
            logger,
            filter: filter_builder.build(),
        })
    }

    /// The most verbose level this bridge lets through.
    #[must_use]
    pub fn max_level(&self) -> LevelFilter {
        self.filter.filter()
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata) && self.logger.enabled(level_from_log(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.filter.matches(record) {
            return;
        }
        let level = level_from_log(record.level());
        if !self.logger.enabled(level) {
            return;
        }

        let bridged = Record::new(level, record.args().to_string())
            .with_attrs([Attr::new(CODE_NAMESPACE, record.target().to_owned())]);
        // `log::Log` has no way to report failures
        let _ = self.logger.handler().handle(&bridged);
    }

    fn flush(&self) {}
}

fn level_from_log(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::ERROR,
        log::Level::Warn => Level::WARN,
        log::Level::Info => Level::INFO,
        log::Level::Debug => Level::DEBUG,
        log::Level::Trace => Level::new(-8),
    }
}
