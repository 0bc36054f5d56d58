//! Tests for the console exporter as configured by `configure()`.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use insta::assert_snapshot;
use otel_log_bridge::{
    Attr, configure,
    config::{ConsoleColors, ConsoleOptions, Target},
    processor::BatchConfigBuilder,
};

#[path = "../src/test_utils.rs"]
mod test_utils;

use test_utils::remap_timestamps_in_console_output;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn output_of(output: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(output.lock().unwrap().clone()).unwrap()
}

#[test]
fn test_resource_header_written_once_across_batches() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let telemetry = configure()
        .local()
        .with_service_name("users-api")
        .with_console(
            ConsoleOptions::default()
                .with_colors(ConsoleColors::Never)
                .with_include_timestamps(false)
                .with_target(Target::Pipe(output.clone())),
        )
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_max_export_batch_size(1)
                .build(),
        )
        .with_env(env(&[]))
        .finish()
        .unwrap();
    let logger = telemetry.logger().clone();

    logger.info("first", []);
    logger.warn("second", [Attr::new("retry", 1)]);
    logger.debug("third", []);

    telemetry.shutdown().unwrap();

    let output = output_of(&output);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("resource "));
    assert!(lines[0].contains("service.name=users-api"));
    assert_eq!(
        &lines[1..],
        [
            "  INFO log-bridge first",
            "  WARN log-bridge second retry=1",
            " DEBUG log-bridge third",
        ]
    );
}

#[test]
fn test_explicit_console_options_ignore_format_env() {
    let output = Arc::new(Mutex::new(Vec::new()));

    let telemetry = configure()
        .local()
        .with_service_name("users-api")
        .with_env(env(&[("LOG_BRIDGE_FORMAT", "json")]))
        .with_console(ConsoleOptions::default().with_target(Target::Pipe(output.clone())))
        .finish()
        .unwrap();
    telemetry.logger().info("text", []);
    telemetry.shutdown().unwrap();

    assert!(output_of(&output).starts_with("resource "));
}

#[test]
fn test_text_output_snapshot() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let (logger, guard) = configure()
        .local()
        .with_service_name("users-api")
        .with_service_version("v1.0.0")
        .with_environment("development")
        .with_console(
            ConsoleOptions::default()
                .with_colors(ConsoleColors::Never)
                .with_target(Target::Pipe(output.clone())),
        )
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_scheduled_delay(Duration::from_secs(3600))
                .build(),
        )
        .with_env(env(&[("HOSTNAME", "box-1")]))
        .finish()
        .unwrap()
        .into_parts();

    logger.info("Start Service: 0.0.0.0:8080", []);
    let request = logger.with_group("request").with([Attr::new("id", "42")]);
    request.error("JSON Bind error", [Attr::new("error", "EOF")]);
    request.info("user not found, username: ghost", []);

    guard.shutdown();

    let output = output_of(&output);
    let output = remap_timestamps_in_console_output(&output);
    let output = regex::Regex::new(r"process\.pid=\d+|telemetry\.sdk\.version=[^,\n]+")
        .unwrap()
        .replace_all(&output, "<volatile>");

    assert_snapshot!(output, @r"
    resource deployment.environment=development, host.name=box-1, <volatile>, process.runtime.name=rust, service.name=users-api, service.version=v1.0.0, telemetry.sdk.language=rust, telemetry.sdk.name=opentelemetry, <volatile>
    1970-01-01T00:00:00.000000Z  INFO log-bridge Start Service: 0.0.0.0:8080
    1970-01-01T00:00:00.000001Z ERROR log-bridge JSON Bind error request.id=42, request.error=EOF
    1970-01-01T00:00:00.000002Z  INFO log-bridge user not found, username: ghost request.id=42
    ");
}

#[test]
fn test_json_output() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let (logger, guard) = configure()
        .local()
        .with_service_name("users-api")
        .with_logger_name("users")
        .with_console(
            ConsoleOptions::default()
                .with_format(otel_log_bridge::config::LogFormat::Json)
                .with_target(Target::Pipe(output.clone())),
        )
        .with_env(env(&[]))
        .finish()
        .unwrap()
        .into_parts();

    logger.warn("disk almost full", [Attr::new("free_mb", 12)]);
    guard.shutdown();

    let output = output_of(&output);
    let line: serde_json::Value = serde_json::from_str(output.trim_end()).unwrap();
    assert_eq!(line["severity_text"], "WARN");
    assert_eq!(line["severity_number"], 13);
    assert_eq!(line["body"], "disk almost full");
    assert_eq!(line["scope"], "users");
    assert_eq!(line["attributes"], serde_json::json!({"free_mb": "12"}));
    assert_eq!(line["resource"]["service.name"], "users-api");
    assert!(line["timestamp"].is_string());
    assert!(line["observed_timestamp"].is_string());
}
