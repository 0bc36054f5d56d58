use std::sync::Arc;

use crate::{Attr, Handler, Level, Record};

/// A cheap, cloneable handle for emitting log records through a [`Handler`].
///
/// Derived loggers (from [`with`][Self::with] and [`with_group`][Self::with_group]) share the
/// pipeline of their parent and carry the parent's attributes.
#[derive(Debug, Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

impl Logger {
    /// Create a logger over `handler`.
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        Logger {
            handler: Arc::new(handler),
        }
    }

    /// Create a logger over an already shared handler.
    #[must_use]
    pub fn from_handler(handler: Arc<dyn Handler>) -> Self {
        Logger { handler }
    }

    /// The handler records are sent to.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Whether records at `level` would be emitted.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Emit `message` at `level` with `attrs`, timestamped now.
    ///
    /// Nothing is built if the level is disabled. Handler failures are not reported to the
    /// caller.
    pub fn log(&self, level: Level, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        if !self.handler.enabled(level) {
            return;
        }
        let record = Record::new(level, message).with_attrs(attrs);
        if let Err(e) = self.handler.handle(&record) {
            tracing::warn!(error = %e, "failed to handle log record");
        }
    }

    /// Emit at [`Level::DEBUG`].
    pub fn debug(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::DEBUG, message, attrs);
    }

    /// Emit at [`Level::INFO`].
    pub fn info(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::INFO, message, attrs);
    }

    /// Emit at [`Level::WARN`].
    pub fn warn(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::WARN, message, attrs);
    }

    /// Emit at [`Level::ERROR`].
    pub fn error(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::ERROR, message, attrs);
    }

    /// A logger which adds `attrs` to every record.
    #[must_use]
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Logger {
        Logger {
            handler: self.handler.with_attrs(attrs.into_iter().collect()),
        }
    }

    /// A logger whose attributes are keyed `name.key`.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Logger {
        Logger {
            handler: self.handler.with_group(name),
        }
    }
}
