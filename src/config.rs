//! Configuration options for the log bridge.
//!
//! See [`BridgeConfigBuilder`] for documentation of all these options.

use std::{
    borrow::Cow,
    collections::HashMap,
    convert::Infallible,
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use opentelemetry_sdk::logs::LogExporter;

use crate::{
    ConfigureError, Level,
    internal::env::get_optional_env,
    processor::{BatchConfig, BatchLogProcessor, batch_processor},
    telemetry::Telemetry,
};

/// Wraps a custom exporter in a batch processor once the batch config is known.
pub(crate) type ExporterProcessor = Box<dyn FnOnce(BatchConfig) -> BatchLogProcessor>;

/// Builder for the log bridge, returned from [`configure()`][crate::configure].
#[must_use = "call `.finish()` to complete log bridge configuration."]
pub struct BridgeConfigBuilder {
    pub(crate) local: bool,
    pub(crate) service_name: Option<String>,
    pub(crate) service_version: Option<String>,
    pub(crate) environment: Option<String>,
    pub(crate) console_options: Option<ConsoleOptions>,
    pub(crate) exporter: Option<ExporterProcessor>,
    pub(crate) batch_config: Option<BatchConfig>,
    pub(crate) min_level: Option<Level>,
    pub(crate) logger_name: Cow<'static, str>,
    pub(crate) env: Option<HashMap<String, String>>,
}

impl Default for BridgeConfigBuilder {
    fn default() -> Self {
        Self {
            local: false,
            service_name: None,
            service_version: None,
            environment: None,
            console_options: None,
            exporter: None,
            batch_config: None,
            min_level: None,
            logger_name: Cow::Borrowed(DEFAULT_LOGGER_NAME),
            env: None,
        }
    }
}

/// Name of the instrumentation scope used by the bridge unless overridden.
pub const DEFAULT_LOGGER_NAME: &str = "log-bridge";

impl BridgeConfigBuilder {
    /// Call to configure the bridge for local use only.
    ///
    /// This prevents the configured bridge from registering the global logger provider and the
    /// global `log` logger.
    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    /// Set the [service name] for the application.
    ///
    /// Defaults to `OTEL_SERVICE_NAME` if set, otherwise `unknown_service`.
    ///
    /// [service name]: https://opentelemetry.io/docs/specs/semconv/registry/attributes/service/#service-name
    pub fn with_service_name<T: Into<String>>(mut self, service_name: T) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Set the [service version] for the application.
    ///
    /// Defaults to `SERVICE_VERSION` if set, otherwise the version of this crate.
    ///
    /// [service version]: https://opentelemetry.io/docs/specs/semconv/registry/attributes/service/#service-version
    pub fn with_service_version<T: Into<String>>(mut self, service_version: T) -> Self {
        self.service_version = Some(service_version.into());
        self
    }

    /// Set the [deployment environment] for the application.
    ///
    /// Defaults to `DEPLOYMENT_ENVIRONMENT` if set, otherwise `development`.
    ///
    /// [deployment environment]: https://opentelemetry.io/docs/specs/semconv/registry/attributes/deployment/#deployment-environment-name
    pub fn with_environment<T: Into<String>>(mut self, environment: T) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets console options.
    ///
    /// If not set, will use `ConsoleOptions::default()`, with the format taken from
    /// `LOG_BRIDGE_FORMAT` if set.
    pub fn with_console(mut self, console_options: ConsoleOptions) -> Self {
        self.console_options = Some(console_options);
        self
    }

    /// Export to `exporter` instead of the console.
    pub fn with_exporter<T: LogExporter + 'static>(mut self, exporter: T) -> Self {
        self.exporter = Some(Box::new(move |config| batch_processor(exporter, config)));
        self
    }

    /// Configure batching. Defaults to [`BatchConfig::default()`], which reads the
    /// `OTEL_BLRP_*` environment variables.
    pub fn with_batch_config(mut self, batch_config: BatchConfig) -> Self {
        self.batch_config = Some(batch_config);
        self
    }

    /// Only handle records at or above `level`.
    ///
    /// By default every level is enabled.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Set the name of the logger (instrumentation scope) records are emitted with.
    pub fn with_logger_name<T: Into<Cow<'static, str>>>(mut self, name: T) -> Self {
        self.logger_name = name.into();
        self
    }

    /// Read configuration from `env` instead of the process environment.
    #[doc(hidden)] // used in tests
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Finish configuring the bridge.
    ///
    /// Unless [`local()`][Self::local] was called, this registers global state and can
    /// therefore only succeed once per program.
    ///
    /// # Errors
    ///
    /// See [`ConfigureError`] for possible errors.
    pub fn finish(self) -> Result<Telemetry, ConfigureError> {
        Telemetry::from_config_builder(self)
    }
}

/// Options for controlling console output.
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub(crate) colors: ConsoleColors,
    pub(crate) target: Target,
    pub(crate) format: LogFormat,
    pub(crate) include_timestamps: bool,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        ConsoleOptions {
            colors: ConsoleColors::default(),
            target: Target::default(),
            format: LogFormat::default(),
            include_timestamps: true,
        }
    }
}

impl ConsoleOptions {
    /// Set the target for console output.
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Control whether to show colors in the console.
    #[must_use]
    pub fn with_colors(mut self, colors: ConsoleColors) -> Self {
        self.colors = colors;
        self
    }

    /// Set whether to include timestamps in text output.
    #[must_use]
    pub fn with_include_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }
}

/// Whether to show colors in the console.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleColors {
    /// Decide based on the terminal.
    #[default]
    Auto,
    /// Always show colors.
    Always,
    /// Never show colors.
    Never,
}

/// How records are serialized by the console exporter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One human-readable line per record, with a resource header before the first batch.
    #[default]
    Text,
    /// One JSON object per line, each carrying the resource.
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigureError::InvalidConfigurationValue {
                parameter: "LOG_BRIDGE_FORMAT",
                value: s.to_owned(),
            }),
        }
    }
}

/// Console target, either `stdout`, `stderr` or a custom pipe.
#[derive(Default, Clone)]
pub enum Target {
    /// Console output will be sent to standard output.
    #[default]
    Stdout,
    /// Console output will be sent to standard error.
    Stderr,
    /// Console output will be sent to a custom pipe.
    ///
    /// The outer Arc allows inspecting the output from elsewhere, e.g. in tests.
    Pipe(Arc<Mutex<dyn std::io::Write + Send + 'static>>),
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Stdout => write!(f, "stdout"),
            Target::Stderr => write!(f, "stderr"),
            Target::Pipe(_) => write!(f, "pipe"),
        }
    }
}

pub(crate) trait ParseConfigValue: Sized {
    fn parse_config_value(s: &str) -> Result<Self, ConfigureError>;
}

impl<T> ParseConfigValue for T
where
    T: FromStr,
    ConfigureError: From<T::Err>,
{
    fn parse_config_value(s: &str) -> Result<Self, ConfigureError> {
        Ok(s.parse()?)
    }
}

/// A configuration value which may be set programmatically, via the environment, or defaulted.
pub(crate) struct ConfigValue<T> {
    env_vars: &'static [&'static str],
    default_value: fn() -> T,
}

impl<T> ConfigValue<T> {
    const fn new(env_vars: &'static [&'static str], default_value: fn() -> T) -> Self {
        Self {
            env_vars,
            default_value,
        }
    }
}

impl<T: ParseConfigValue> ConfigValue<T> {
    /// Resolves a config value, using the provided value if present, otherwise falling back to the environment variable or the default.
    pub(crate) fn resolve(
        &self,
        value: Option<T>,
        env: Option<&HashMap<String, String>>,
    ) -> Result<T, ConfigureError> {
        if let Some(v) = value {
            return Ok(v);
        }

        for var in self.env_vars {
            if let Some(s) = get_optional_env(var, env)?.filter(|s| !s.is_empty()) {
                return T::parse_config_value(&s);
            }
        }

        Ok((self.default_value)())
    }
}

impl From<Infallible> for ConfigureError {
    fn from(_: Infallible) -> Self {
        unreachable!("Infallible cannot be constructed")
    }
}

pub(crate) static SERVICE_NAME: ConfigValue<String> =
    ConfigValue::new(&["OTEL_SERVICE_NAME"], || "unknown_service".to_string());

pub(crate) static SERVICE_VERSION: ConfigValue<String> =
    ConfigValue::new(&["SERVICE_VERSION", "OTEL_SERVICE_VERSION"], || {
        env!("CARGO_PKG_VERSION").to_string()
    });

pub(crate) static DEPLOYMENT_ENVIRONMENT: ConfigValue<String> =
    ConfigValue::new(&["DEPLOYMENT_ENVIRONMENT"], || "development".to_string());

pub(crate) static LOG_FORMAT: ConfigValue<LogFormat> =
    ConfigValue::new(&["LOG_BRIDGE_FORMAT"], LogFormat::default);
