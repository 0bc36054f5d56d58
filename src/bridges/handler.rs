use std::{fmt::Debug, sync::Arc};

use opentelemetry::logs::{LogRecord as _, Logger as _, Severity};
use opentelemetry_sdk::logs::SdkLogger;

use crate::{Attr, HandleError, Level, Record};

/// Receives [`Record`]s from a [`Logger`][crate::Logger].
///
/// Handlers are immutable: `with_attrs` and `with_group` return a new handler and leave the
/// receiver untouched, so a handler can be shared freely between threads and derived loggers.
pub trait Handler: Send + Sync + Debug {
    /// Whether records at `level` would be handled. Callers check this before building a
    /// record.
    fn enabled(&self, level: Level) -> bool;

    /// Handle a single record.
    ///
    /// # Errors
    ///
    /// Implementations may return an error if the record could not be handled.
    fn handle(&self, record: &Record) -> Result<(), HandleError>;

    /// A handler which adds `attrs` to every record, after any attributes this handler adds.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// A handler which qualifies the keys of all later attributes with `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}

/// The severity number and text for a level. Only the four named levels have one.
fn severity(level: Level) -> Option<(Severity, &'static str)> {
    match level {
        Level::DEBUG => Some((Severity::Debug, "DEBUG")),
        Level::INFO => Some((Severity::Info, "INFO")),
        Level::WARN => Some((Severity::Warn, "WARN")),
        Level::ERROR => Some((Severity::Error, "ERROR")),
        _ => None,
    }
}

/// A [`Handler`] which translates records into OpenTelemetry log records and emits them
/// through an [`SdkLogger`].
///
/// Derived handlers share the logger and the accumulated attributes with their parent.
#[derive(Debug, Clone)]
pub struct OtelHandler {
    logger: Arc<SdkLogger>,
    /// Attributes added through `with_attrs`, keys already qualified.
    attrs: Arc<[(String, String)]>,
    /// `group.` for every open group, e.g. `request.user.`.
    group_prefix: Arc<str>,
    min_level: Option<Level>,
}

impl OtelHandler {
    /// Create a handler emitting through `logger`, with every level enabled.
    #[must_use]
    pub fn new(logger: SdkLogger) -> Self {
        OtelHandler {
            logger: Arc::new(logger),
            attrs: Arc::new([]),
            group_prefix: Arc::from(""),
            min_level: None,
        }
    }

    /// Only handle records at or above `level`.
    #[must_use]
    pub fn with_min_level(mut self, level: Option<Level>) -> Self {
        self.min_level = level;
        self
    }

    fn qualify(&self, key: &str) -> String {
        format!("{}{key}", self.group_prefix)
    }
}

impl Handler for OtelHandler {
    fn enabled(&self, level: Level) -> bool {
        self.min_level.is_none_or(|min| level >= min)
    }

    fn handle(&self, record: &Record) -> Result<(), HandleError> {
        let mut log_record = self.logger.create_log_record();

        log_record.set_timestamp(record.time);
        log_record.set_body(record.message.clone().into());
        if let Some((number, text)) = severity(record.level) {
            log_record.set_severity_number(number);
            log_record.set_severity_text(text);
        }

        for (key, value) in self.attrs.iter() {
            log_record.add_attribute(key.clone(), value.clone());
        }
        for attr in &record.attrs {
            log_record.add_attribute(self.qualify(&attr.key), attr.value.to_string());
        }

        self.logger.emit(log_record);
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        if attrs.is_empty() {
            return Arc::new(self.clone());
        }

        let combined: Vec<(String, String)> = self
            .attrs
            .iter()
            .cloned()
            .chain(
                attrs
                    .iter()
                    .map(|attr| (self.qualify(&attr.key), attr.value.to_string())),
            )
            .collect();

        Arc::new(OtelHandler {
            attrs: combined.into(),
            ..self.clone()
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        if name.is_empty() {
            return Arc::new(self.clone());
        }

        Arc::new(OtelHandler {
            group_prefix: format!("{}{name}.", self.group_prefix).into(),
            ..self.clone()
        })
    }
}
