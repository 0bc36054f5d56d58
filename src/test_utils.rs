#![allow(dead_code)] // used by lib and test suites individually

use std::{
    borrow::Cow,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{self, Duration, SystemTime},
};

use opentelemetry::logs::AnyValue;
use opentelemetry_sdk::{Resource, logs::SdkLogRecord};
use regex::{Captures, Regex};

static GLOBAL_MUTEX: Mutex<()> = Mutex::new(());

/// Serializes tests which touch process-wide state (the global provider, the `log` logger or
/// environment variables).
pub fn lock_global_state() -> MutexGuard<'static, ()> {
    GLOBAL_MUTEX.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resource attributes rendered as sorted `key=value` strings, with values that differ
/// between machines and SDK releases replaced by placeholders.
pub fn make_deterministic_resource(resource: &Resource) -> Vec<String> {
    let mut attrs: Vec<String> = resource
        .iter()
        .map(|(key, value)| match key.as_str() {
            "process.pid" => format!("{key}=<pid>"),
            "telemetry.sdk.version" => format!("{key}=<version>"),
            _ => format!("{key}={value}"),
        })
        .collect();
    attrs.sort();
    attrs
}

/// A timestamp `secs` seconds after the unix epoch.
pub fn timestamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn remap_timestamps_in_console_output(output: &str) -> Cow<'_, str> {
    // Replace all timestamps in output to make them deterministic
    let mut timestamp = chrono::DateTime::UNIX_EPOCH;
    let re = Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{6}Z").unwrap();
    re.replace_all(output, |_: &Captures<'_>| {
        let replaced = timestamp.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        timestamp += time::Duration::from_micros(1);
        replaced
    })
}

/// The body of a log record, which the bridge always sets to a string.
pub fn log_body(record: &SdkLogRecord) -> &str {
    match record.body() {
        Some(AnyValue::String(s)) => s.as_str(),
        other => panic!("expected string body, got {other:?}"),
    }
}

/// Attributes of a log record as `(key, value)` strings, in emission order.
pub fn log_attrs(record: &SdkLogRecord) -> Vec<(String, String)> {
    record
        .attributes_iter()
        .map(|(key, value)| {
            let value = match value {
                AnyValue::String(s) => s.as_str().to_owned(),
                other => format!("{other:?}"),
            };
            (key.as_str().to_owned(), value)
        })
        .collect()
}
