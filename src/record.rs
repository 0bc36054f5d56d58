//! The generic, backend-agnostic log record accepted by a [`Handler`][crate::Handler].

use std::{borrow::Cow, fmt, time::SystemTime};

/// The importance of a log record.
///
/// Levels are plain integers so that applications can define their own
/// levels between the named ones; only the four named levels have a
/// severity mapping in the OpenTelemetry pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    /// Verbose output used while debugging.
    pub const DEBUG: Level = Level(-4);
    /// Normal operational messages.
    pub const INFO: Level = Level(0);
    /// Something unexpected which the program recovered from.
    pub const WARN: Level = Level(4);
    /// A failure.
    pub const ERROR: Level = Level(8);

    /// Create a level from its integer value.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Level(level)
    }

    /// The integer value of this level.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::DEBUG => f.write_str("DEBUG"),
            Level::INFO => f.write_str("INFO"),
            Level::WARN => f.write_str("WARN"),
            Level::ERROR => f.write_str("ERROR"),
            Level(other) => write!(f, "LEVEL({other})"),
        }
    }
}

/// The value of an attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A string value.
    String(String),
    /// A signed integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A key-value pair attached to a log record or a derived logger.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr {
    /// The attribute name.
    pub key: Cow<'static, str>,
    /// The attribute value.
    pub value: Value,
}

impl Attr {
    /// Create a new attribute.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single log call, as produced by application code.
#[derive(Clone, Debug)]
pub struct Record {
    /// When the log call happened.
    pub time: SystemTime,
    /// The log message.
    pub message: String,
    /// The level of the log call.
    pub level: Level,
    /// Attributes in the order they were supplied.
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Create a record timestamped now, without attributes.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            time: SystemTime::now(),
            message: message.into(),
            level,
            attrs: Vec::new(),
        }
    }

    /// Override the timestamp.
    #[must_use]
    pub fn with_time(mut self, time: SystemTime) -> Self {
        self.time = time;
        self
    }

    /// Append attributes to the record.
    #[must_use]
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }
}
