use std::{collections::HashMap, sync::Arc};

use opentelemetry_sdk::Resource;

use crate::{
    ConfigureError, Logger, LoggerProvider, OtelHandler, ShutdownError,
    bridges::log::LogBridge,
    config::{
        BridgeConfigBuilder, ConsoleOptions, DEPLOYMENT_ENVIRONMENT, LOG_FORMAT, SERVICE_NAME,
        SERVICE_VERSION,
    },
    exporters::ConsoleLogExporter,
    processor::batch_processor,
    provider::{global_logger_provider, set_global_logger_provider},
    resource::build_resource,
};

/// A configured log pipeline: the [`LoggerProvider`] and a [`Logger`] bound to it.
///
/// This instance is created by calling [`configure()`][crate::configure].
#[derive(Debug, Clone)]
pub struct Telemetry {
    provider: Arc<LoggerProvider>,
    logger: Logger,
}

impl Telemetry {
    /// The logger bound to this pipeline.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The provider owning the resource and processor.
    #[must_use]
    pub fn provider(&self) -> &Arc<LoggerProvider> {
        &self.provider
    }

    /// The resource attached to every exported record.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        self.provider.resource()
    }

    /// Split into the logger and a guard which shuts the pipeline down.
    ///
    /// # Example
    ///
    /// ```rust
    /// let (logger, guard) = otel_log_bridge::configure()
    ///     .local()
    ///     .finish()
    ///     .expect("failed to configure the log bridge")
    ///     .into_parts();
    ///
    /// logger.info("Hello world", []);
    ///
    /// guard.shutdown();
    /// ```
    pub fn into_parts(self) -> (Logger, ShutdownGuard) {
        let logger = self.logger.clone();
        (logger, self.shutdown_guard())
    }

    /// Create a guard which shuts the pipeline down when dropped.
    ///
    /// It is recommended to keep this guard in the top level of your application so that
    /// buffered records are flushed even when exiting due to a panic.
    pub fn shutdown_guard(self) -> ShutdownGuard {
        ShutdownGuard {
            telemetry: Some(self),
        }
    }

    /// Export every buffered record now, without shutting down.
    ///
    /// # Errors
    ///
    /// See [`ShutdownError`] for possible errors.
    pub fn force_flush(&self) -> Result<(), ShutdownError> {
        self.provider.force_flush()
    }

    /// Flush buffered records and shut the pipeline down.
    ///
    /// # Errors
    ///
    /// See [`ShutdownError`] for possible errors.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        self.provider.shutdown()
    }

    /// Called by `BridgeConfigBuilder::finish()`.
    pub(crate) fn from_config_builder(
        config: BridgeConfigBuilder,
    ) -> Result<Telemetry, ConfigureError> {
        let env = config.env.clone();
        let local = config.local;

        if !local && global_logger_provider().is_some() {
            return Err(ConfigureError::AlreadyConfigured);
        }

        let TelemetryParts { provider, logger } = Self::build_parts(config, env.as_ref())?;

        if !local {
            let bridge = LogBridge::with_env(logger.clone(), env.as_ref())?;
            let max_level = bridge.max_level();
            log::set_boxed_logger(Box::new(bridge))?;
            log::set_max_level(max_level);

            set_global_logger_provider(provider.clone());
        }

        tracing::debug!(local, "log bridge configured");

        Ok(Telemetry { provider, logger })
    }

    fn build_parts(
        config: BridgeConfigBuilder,
        env: Option<&HashMap<String, String>>,
    ) -> Result<TelemetryParts, ConfigureError> {
        let service_name = SERVICE_NAME.resolve(config.service_name, env)?;
        let service_version = SERVICE_VERSION.resolve(config.service_version, env)?;
        let environment = DEPLOYMENT_ENVIRONMENT.resolve(config.environment, env)?;

        let resource = build_resource(&service_name, &service_version, &environment, env)?;

        let batch_config = config.batch_config.unwrap_or_default();

        let processor = match config.exporter {
            Some(build_processor) => build_processor(batch_config),
            None => {
                let console_options = match config.console_options {
                    Some(options) => options,
                    None => ConsoleOptions::default().with_format(LOG_FORMAT.resolve(None, env)?),
                };
                batch_processor(ConsoleLogExporter::new(console_options), batch_config)
            }
        };

        let provider = Arc::new(LoggerProvider::new(resource, processor));

        let handler = OtelHandler::new(provider.logger(config.logger_name))
            .with_min_level(config.min_level);

        Ok(TelemetryParts {
            provider,
            logger: Logger::new(handler),
        })
    }
}

struct TelemetryParts {
    provider: Arc<LoggerProvider>,
    logger: Logger,
}

/// A guard that shuts the log pipeline down when dropped.
///
/// Create this guard with [`Telemetry::into_parts()`] or [`Telemetry::shutdown_guard()`].
#[must_use = "this should be kept alive until logging should be stopped"]
#[derive(Debug)]
pub struct ShutdownGuard {
    telemetry: Option<Telemetry>,
}

impl ShutdownGuard {
    /// Flush buffered records and shut the pipeline down.
    ///
    /// A failure is reported through `tracing` and otherwise ignored, since the pipeline which
    /// would normally carry the report is the one being shut down. Use
    /// [`try_shutdown`][Self::try_shutdown] to handle the error instead.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    /// Flush buffered records and shut the pipeline down, returning any failure.
    ///
    /// # Errors
    ///
    /// See [`ShutdownError`] for possible errors.
    pub fn try_shutdown(mut self) -> Result<(), ShutdownError> {
        match self.telemetry.take() {
            Some(telemetry) => telemetry.shutdown(),
            None => Ok(()),
        }
    }

    fn shutdown_inner(&mut self) {
        if let Some(telemetry) = self.telemetry.take() {
            if let Err(error) = telemetry.shutdown() {
                tracing::error!(%error, "failed to shut down the log pipeline cleanly");
            }
        }
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc, time::Duration};

    use opentelemetry::{InstrumentationScope, Key};
    use opentelemetry_sdk::{
        Resource,
        error::{OTelSdkError, OTelSdkResult},
        logs::{InMemoryLogExporter, LogProcessor, SdkLogRecord},
    };

    use super::Telemetry;
    use crate::{
        Attr, ConfigureError, Level, Logger, LoggerProvider, OtelHandler, ShutdownError,
        configure,
        processor::BatchConfigBuilder,
        test_utils::{log_attrs, log_body},
    };

    /// A processor whose shutdown always fails.
    #[derive(Debug)]
    struct FailingShutdown;

    impl LogProcessor for FailingShutdown {
        fn emit(&self, _record: &mut SdkLogRecord, _scope: &InstrumentationScope) {}

        fn force_flush(&self) -> OTelSdkResult {
            Ok(())
        }

        fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
            Err(OTelSdkError::InternalFailure("sink unavailable".into()))
        }

        fn shutdown(&self) -> OTelSdkResult {
            self.shutdown_with_timeout(Duration::from_secs(5))
        }
    }

    fn failing_telemetry() -> Telemetry {
        let provider = Arc::new(LoggerProvider::new(
            Resource::builder_empty().build(),
            FailingShutdown,
        ));
        let logger = Logger::new(OtelHandler::new(provider.logger("test")));
        Telemetry { provider, logger }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn resource_value(telemetry: &super::Telemetry, key: &'static str) -> Option<String> {
        telemetry
            .resource()
            .get(&Key::from_static_str(key))
            .map(|v| v.to_string())
    }

    #[test]
    fn test_identity_resolution() {
        for (env, builder_name, expected_name, expected_version, expected_env) in [
            (vec![], None, "unknown_service", env!("CARGO_PKG_VERSION"), "development"),
            (
                vec![
                    ("OTEL_SERVICE_NAME", "from-env"),
                    ("SERVICE_VERSION", "v9"),
                    ("DEPLOYMENT_ENVIRONMENT", "prod"),
                ],
                None,
                "from-env",
                "v9",
                "prod",
            ),
            (
                vec![("OTEL_SERVICE_NAME", "from-env")],
                Some("explicit"),
                "explicit",
                env!("CARGO_PKG_VERSION"),
                "development",
            ),
        ] {
            let mut builder = configure()
                .local()
                .with_exporter(InMemoryLogExporter::default())
                .with_env(self::env(&env));
            if let Some(name) = builder_name {
                builder = builder.with_service_name(name);
            }
            let telemetry = builder.finish().unwrap();

            assert_eq!(
                resource_value(&telemetry, "service.name").as_deref(),
                Some(expected_name)
            );
            assert_eq!(
                resource_value(&telemetry, "service.version").as_deref(),
                Some(expected_version)
            );
            assert_eq!(
                resource_value(&telemetry, "deployment.environment").as_deref(),
                Some(expected_env)
            );
            telemetry.shutdown().unwrap();
        }
    }

    #[test]
    fn test_invalid_log_format() {
        let result = configure()
            .local()
            .with_env(env(&[("LOG_BRIDGE_FORMAT", "yaml")]))
            .finish();
        let Err(err) = result else {
            panic!("expected an error for LOG_BRIDGE_FORMAT=yaml");
        };
        assert!(matches!(err, ConfigureError::InvalidConfigurationValue { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for LOG_BRIDGE_FORMAT: yaml"
        );
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let exporter = InMemoryLogExporter::default();
        let telemetry = configure()
            .local()
            .with_service_name("users-api")
            .with_service_version("v1.0.0")
            .with_environment("development")
            .with_logger_name("users")
            .with_exporter(exporter.clone())
            .with_env(HashMap::new())
            .finish()
            .unwrap();
        let logger = telemetry.logger();

        logger.info("Start Service: 0.0.0.0:8080", []);
        logger
            .with([Attr::new("request_id", "abc")])
            .error("User not found", [Attr::new("username", "ghost")]);

        telemetry.force_flush().unwrap();

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(log_body(&logs[0].record), "Start Service: 0.0.0.0:8080");
        assert_eq!(logs[0].instrumentation.name(), "users");
        assert_eq!(
            log_attrs(&logs[1].record),
            [
                ("request_id".to_string(), "abc".to_string()),
                ("username".to_string(), "ghost".to_string()),
            ]
        );
        for log in &logs {
            assert!(log.resource.iter().any(|(k, v)| k.as_str() == "service.name"
                && v.to_string() == "users-api"));
        }

        telemetry.shutdown().unwrap();
    }

    #[test]
    fn test_min_level() {
        let exporter = InMemoryLogExporter::default();
        let telemetry = configure()
            .local()
            .with_min_level(Level::WARN)
            .with_exporter(exporter.clone())
            .with_env(HashMap::new())
            .finish()
            .unwrap();
        let logger = telemetry.logger();

        logger.debug("hidden", []);
        logger.info("hidden", []);
        logger.warn("shown", []);
        telemetry.force_flush().unwrap();

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(log_body(&logs[0].record), "shown");

        telemetry.shutdown().unwrap();
    }

    #[test]
    fn test_guard_flushes_on_drop() {
        let exporter = InMemoryLogExporter::default();
        {
            let (logger, _guard) = configure()
                .local()
                .with_exporter(exporter.clone())
                .with_batch_config(
                    BatchConfigBuilder::default()
                        .with_scheduled_delay(Duration::from_secs(3600))
                        .build(),
                )
                .with_env(HashMap::new())
                .finish()
                .unwrap()
                .into_parts();
            logger.info("buffered", []);
            assert!(exporter.get_emitted_logs().unwrap().is_empty());
        }
        assert_eq!(exporter.get_emitted_logs().unwrap().len(), 1);
    }

    #[test]
    fn test_shutdown_twice_and_log_after_shutdown() {
        let exporter = InMemoryLogExporter::default();
        let telemetry = configure()
            .local()
            .with_exporter(exporter.clone())
            .with_env(HashMap::new())
            .finish()
            .unwrap();
        let logger = telemetry.logger().clone();

        logger.info("before", []);
        telemetry.force_flush().unwrap();
        telemetry.shutdown().unwrap();
        telemetry.shutdown().unwrap();
        logger.info("after", []);

        let guard = telemetry.shutdown_guard();
        guard.try_shutdown().unwrap();

        let logs = exporter.get_emitted_logs().unwrap();
        assert!(logs.iter().all(|log| log_body(&log.record) == "before"));
    }

    #[test]
    fn test_guard_shutdown_failure() {
        let err = failing_telemetry()
            .shutdown_guard()
            .try_shutdown()
            .unwrap_err();
        assert!(matches!(
            err,
            ShutdownError::OtelError(OTelSdkError::InternalFailure(_))
        ));

        // reported through tracing, not raised
        failing_telemetry().shutdown_guard().shutdown();
        drop(failing_telemetry().into_parts());
    }
}
