//! Construction of the [`Resource`] describing the running process.
//!
//! The resource is built on an empty builder rather than by merging two default resources
//! which may carry different schema URLs. Entries of `OTEL_RESOURCE_ATTRIBUTES` are picked up by
//! the SDK's [`EnvResourceDetector`], which always reads the process environment.

use std::collections::HashMap;

use opentelemetry::KeyValue;
use opentelemetry_sdk::{
    Resource,
    resource::{EnvResourceDetector, TelemetryResourceDetector},
};

use crate::{ConfigureError, internal::env::get_optional_env};

/// `service.name` resource attribute.
pub const SERVICE_NAME: &str = "service.name";
/// `service.version` resource attribute.
pub const SERVICE_VERSION: &str = "service.version";
/// `deployment.environment` resource attribute.
pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
/// `host.name` resource attribute.
pub const HOST_NAME: &str = "host.name";
/// `process.pid` resource attribute.
pub const PROCESS_PID: &str = "process.pid";
/// `process.runtime.name` resource attribute.
pub const PROCESS_RUNTIME_NAME: &str = "process.runtime.name";

/// Build the resource for this process.
///
/// Process defaults (`telemetry.sdk.*`, `process.pid`, `process.runtime.name`, `host.name`
/// when known, and entries of `OTEL_RESOURCE_ATTRIBUTES`) are applied first; the service
/// identity is applied last so it wins over any duplicate key.
///
/// If `env` is provided it is used instead of the process environment to find the host name.
///
/// # Errors
///
/// Returns an error if an environment variable consulted here cannot be read.
pub fn build_resource(
    service_name: &str,
    version: &str,
    environment: &str,
    env: Option<&HashMap<String, String>>,
) -> Result<Resource, ConfigureError> {
    let mut defaults = vec![
        KeyValue::new(PROCESS_PID, i64::from(std::process::id())),
        KeyValue::new(PROCESS_RUNTIME_NAME, "rust"),
    ];

    if let Some(host_name) = detect_host_name(env)? {
        defaults.push(KeyValue::new(HOST_NAME, host_name));
    }

    Ok(Resource::builder_empty()
        .with_detector(Box::new(TelemetryResourceDetector))
        .with_attributes(defaults)
        .with_detector(Box::new(EnvResourceDetector::new()))
        .with_attributes([
            KeyValue::new(SERVICE_NAME, service_name.to_owned()),
            KeyValue::new(SERVICE_VERSION, version.to_owned()),
            KeyValue::new(DEPLOYMENT_ENVIRONMENT, environment.to_owned()),
        ])
        .build())
}

fn detect_host_name(env: Option<&HashMap<String, String>>) -> Result<Option<String>, ConfigureError> {
    if let Some(host_name) = get_optional_env("HOSTNAME", env)? {
        if !host_name.trim().is_empty() {
            return Ok(Some(host_name.trim().to_owned()));
        }
    }
    // an explicit environment means "don't look at the machine"
    if env.is_some() {
        return Ok(None);
    }
    Ok(std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty()))
}
