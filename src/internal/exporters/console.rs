use std::{
    future::Future,
    io::{self, BufWriter, IsTerminal, Write},
    sync::{
        LazyLock,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, SystemTime},
};

use chrono::{DateTime, SecondsFormat, Utc};
use nu_ansi_term::{Color, Style};
use opentelemetry::{
    InstrumentationScope, Value,
    logs::{AnyValue, Severity},
};
use opentelemetry_sdk::{
    Resource,
    error::{OTelSdkError, OTelSdkResult},
    logs::{LogBatch, LogExporter, SdkLogRecord},
};
use serde_json::{Map, Number, json};

use crate::config::{ConsoleColors, ConsoleOptions, LogFormat, Target};

static DIMMED: LazyLock<Style> = LazyLock::new(|| Style::new().dimmed());
static DIMMED_AND_ITALIC: LazyLock<Style> = LazyLock::new(|| DIMMED.italic());
static BOLD: LazyLock<Style> = LazyLock::new(|| Style::new().bold());
static ITALIC: LazyLock<Style> = LazyLock::new(|| Style::new().italic());

/// Exporter which writes log records to the console, or to a custom [`Target`].
///
/// In [`LogFormat::Text`] the resource is written once, before the first exported batch. In
/// [`LogFormat::Json`] every line carries the resource.
#[derive(Debug)]
pub struct ConsoleLogExporter {
    options: ConsoleOptions,
    colors: bool,
    resource: Resource,
    resource_emitted: AtomicBool,
    is_shutdown: AtomicBool,
}

impl ConsoleLogExporter {
    /// Create an exporter writing according to `options`.
    #[must_use]
    pub fn new(options: ConsoleOptions) -> Self {
        let colors = match options.colors {
            ConsoleColors::Always => true,
            ConsoleColors::Never => false,
            ConsoleColors::Auto => match &options.target {
                Target::Stdout => io::stdout().is_terminal(),
                Target::Stderr => io::stderr().is_terminal(),
                Target::Pipe(_) => false,
            },
        };
        Self {
            options,
            colors,
            resource: Resource::builder_empty().build(),
            resource_emitted: AtomicBool::new(false),
            is_shutdown: AtomicBool::new(false),
        }
    }

    fn with_writer<R>(&self, f: impl FnOnce(&mut dyn Write) -> R) -> R {
        match &self.options.target {
            Target::Stdout => f(&mut io::stdout().lock()),
            Target::Stderr => f(&mut io::stderr().lock()),
            Target::Pipe(p) => {
                let mut pipe = p.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                f(&mut *pipe)
            }
        }
    }

    fn write_batch(
        &self,
        batch: &[(&SdkLogRecord, &InstrumentationScope)],
        w: &mut dyn Write,
    ) -> io::Result<()> {
        let mut w = BufWriter::new(w);
        match self.options.format {
            LogFormat::Text => {
                // only marked as emitted once the header has actually been written
                let write_header = !self.resource_emitted.load(Ordering::SeqCst);
                if write_header {
                    self.resource_to_writer(&mut w)?;
                }
                for (record, scope) in batch {
                    self.text_to_writer(record, scope, &mut w)?;
                }
                w.flush()?;
                if write_header {
                    self.resource_emitted.store(true, Ordering::SeqCst);
                }
                Ok(())
            }
            LogFormat::Json => {
                let resource = resource_to_json(&self.resource);
                for (record, scope) in batch {
                    let line = record_to_json(record, scope, &resource);
                    serde_json::to_writer(&mut w, &line)?;
                    writeln!(w)?;
                }
                w.flush()
            }
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colors {
            style.paint(text).to_string()
        } else {
            text.to_owned()
        }
    }

    fn resource_to_writer<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut attrs: Vec<(String, String)> = self
            .resource
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        attrs.sort();

        write!(w, "{}", self.paint(*DIMMED, "resource"))?;
        for (idx, (key, value)) in attrs.iter().enumerate() {
            write!(w, " {}={value}", self.paint(*ITALIC, key))?;
            if idx < attrs.len() - 1 {
                write!(w, ",")?;
            }
        }
        writeln!(w)
    }

    fn text_to_writer<W: Write>(
        &self,
        record: &SdkLogRecord,
        scope: &InstrumentationScope,
        w: &mut W,
    ) -> io::Result<()> {
        if self.options.include_timestamps {
            if let Some(timestamp) = record.timestamp() {
                write!(w, "{}", self.paint(*DIMMED, &format_timestamp(timestamp)))?;
            }
        }

        self.severity_to_writer(record.severity_number(), record.severity_text(), w)?;

        write!(w, " {}", self.paint(*DIMMED_AND_ITALIC, scope.name()))?;

        if let Some(body) = record.body() {
            write!(w, " {}", self.paint(*BOLD, &any_value_to_string(body)))?;
        }

        let fields: Vec<_> = record.attributes_iter().collect();
        for (idx, (key, value)) in fields.iter().enumerate() {
            write!(
                w,
                " {}={}",
                self.paint(*ITALIC, key.as_str()),
                any_value_to_string(value)
            )?;
            if idx < fields.len() - 1 {
                write!(w, ",")?;
            }
        }

        writeln!(w)
    }

    fn severity_to_writer<W: Write>(
        &self,
        number: Option<Severity>,
        text: Option<&str>,
        w: &mut W,
    ) -> io::Result<()> {
        let (Some(number), Some(text)) = (number, text) else {
            return write!(w, " {}", self.paint(Color::DarkGray.normal(), "-----"));
        };
        let color = match number as i32 {
            1..=4 => Color::Purple,
            5..=8 => Color::Blue,
            9..=12 => Color::Green,
            13..=16 => Color::Yellow,
            _ => Color::Red,
        };
        write!(w, " {}", self.paint(color.normal(), &format!("{text:>5}")))
    }
}

impl LogExporter for ConsoleLogExporter {
    #[allow(clippy::manual_async_fn)]
    fn export(&self, batch: LogBatch<'_>) -> impl Future<Output = OTelSdkResult> + Send {
        async move {
            if self.is_shutdown.load(Ordering::SeqCst) {
                return Err(OTelSdkError::AlreadyShutdown);
            }
            let batch: Vec<_> = batch.iter().collect();
            if batch.is_empty() {
                return Ok(());
            }
            self.with_writer(|w| self.write_batch(&batch, w))
                .map_err(|e| OTelSdkError::InternalFailure(format!("console write failed: {e}")))
        }
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        self.is_shutdown.store(true, Ordering::SeqCst);
        self.with_writer(|w| w.flush())
            .map_err(|e| OTelSdkError::InternalFailure(format!("console flush failed: {e}")))
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.resource = resource.clone();
    }
}

fn format_timestamp(timestamp: SystemTime) -> String {
    let timestamp: DateTime<Utc> = timestamp.into();
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn any_value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => s.as_str().to_owned(),
        AnyValue::Int(i) => i.to_string(),
        AnyValue::Double(d) => d.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

fn any_value_to_json(value: &AnyValue) -> serde_json::Value {
    match value {
        AnyValue::String(s) => json!(s.as_str()),
        AnyValue::Int(i) => json!(i),
        AnyValue::Double(d) => Number::from_f64(*d).map_or(serde_json::Value::Null, Into::into),
        AnyValue::Boolean(b) => json!(b),
        AnyValue::ListAny(values) => values.iter().map(any_value_to_json).collect(),
        AnyValue::Map(map) => map
            .iter()
            .map(|(k, v)| (k.as_str().to_owned(), any_value_to_json(v)))
            .collect::<Map<_, _>>()
            .into(),
        other => json!(format!("{other:?}")),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => json!(b),
        Value::I64(i) => json!(i),
        Value::F64(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, Into::into),
        other => json!(other.to_string()),
    }
}

fn resource_to_json(resource: &Resource) -> serde_json::Value {
    resource
        .iter()
        .map(|(k, v)| (k.to_string(), value_to_json(v)))
        .collect::<Map<_, _>>()
        .into()
}

fn record_to_json(
    record: &SdkLogRecord,
    scope: &InstrumentationScope,
    resource: &serde_json::Value,
) -> serde_json::Value {
    let rfc3339 = |t: SystemTime| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Micros, true);
    let attributes: Map<String, serde_json::Value> = record
        .attributes_iter()
        .map(|(k, v)| (k.to_string(), any_value_to_json(v)))
        .collect();

    json!({
        "timestamp": record.timestamp().map(rfc3339),
        "observed_timestamp": record.observed_timestamp().map(rfc3339),
        "severity_text": record.severity_text(),
        "severity_number": record.severity_number().map(|s| s as i32),
        "body": record.body().map(any_value_to_json),
        "scope": scope.name(),
        "attributes": attributes,
        "resource": resource,
    })
}
