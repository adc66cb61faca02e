//! The shared config for the Sonar operator

use schemars::JsonSchema;
use std::path::Path;

/// Helps serde default the clean tick requeue delay to 30 seconds
fn default_requeue() -> u64 {
    30
}

/// Helps serde default the error requeue delay to 60 seconds
fn default_error_requeue() -> u64 {
    60
}

/// Settings for the outer reconcile loop
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct OperatorSettings {
    /// How long to wait before requeueing a cluster after a clean tick in seconds
    #[serde(default = "default_requeue")]
    pub requeue: u64,
    /// How long to wait before requeueing a cluster after a failed tick in seconds
    #[serde(default = "default_error_requeue")]
    pub error_requeue: u64,
}

impl Default for OperatorSettings {
    /// Create a default `OperatorSettings` object
    fn default() -> Self {
        OperatorSettings {
            requeue: default_requeue(),
            error_requeue: default_error_requeue(),
        }
    }
}

/// Helps serde default the gateway scheme to http
fn default_scheme() -> String {
    "http".to_owned()
}

/// Helps serde default the gateway call deadline to 30 seconds
fn default_timeout() -> u64 {
    30
}

/// Helps serde default a value to false
fn default_false() -> bool {
    false
}

/// Settings for talking to a managed cluster's REST api
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct GatewaySettings {
    /// The scheme to reach managed clusters at
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// The deadline for a single gateway call in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whether to accept self signed certs from managed clusters
    #[serde(default = "default_false")]
    pub insecure: bool,
}

impl Default for GatewaySettings {
    /// Create a default `GatewaySettings` object
    fn default() -> Self {
        GatewaySettings {
            scheme: default_scheme(),
            timeout: default_timeout(),
            insecure: false,
        }
    }
}

/// The tracing settings for stdout/stderr
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct TracingLocal {
    /// The log level to use for stdout/stderr
    #[serde(default)]
    pub level: LogLevel,
}

impl Default for TracingLocal {
    /// Create a default tracing local config
    fn default() -> Self {
        TracingLocal {
            level: LogLevel::Info,
        }
    }
}

/// The tracing settings to use
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema, Default)]
pub struct Tracing {
    /// The settings for sending traces to stdout/stderr
    #[serde(default)]
    pub local: TracingLocal,
}

/// The log level to set
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy, JsonSchema)]
pub enum LogLevel {
    /// Do not log any info
    Off,
    /// Log at the error level
    Error,
    /// Log at the warning level
    Warn,
    /// Log at the info level
    Info,
    /// Log at the debug level
    Debug,
    /// Log at the tracing level
    Trace,
}

/// Default the log level to Info
impl Default for LogLevel {
    /// Set the default log level to info
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    /// Cast this log level to a tracing filter
    #[must_use]
    pub fn to_filter(&self) -> tracing::metadata::LevelFilter {
        match self {
            LogLevel::Off => tracing_subscriber::filter::LevelFilter::OFF,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
        }
    }
}

impl std::fmt::Display for LogLevel {
    /// Allow the log level to be displayed
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogLevel::Off => write!(f, "Off"),
            LogLevel::Error => write!(f, "Error"),
            LogLevel::Warn => write!(f, "Warn"),
            LogLevel::Info => write!(f, "Info"),
            LogLevel::Debug => write!(f, "Debug"),
            LogLevel::Trace => write!(f, "Trace"),
        }
    }
}

/// The config for the Sonar operator
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema, Default)]
pub struct Conf {
    /// The settings for the outer reconcile loop
    #[serde(default)]
    pub operator: OperatorSettings,
    /// The settings for talking to managed clusters
    #[serde(default)]
    pub gateway: GatewaySettings,
    /// The tracing settings to use
    #[serde(default)]
    pub tracing: Tracing,
}

impl Conf {
    /// Creates a new [Conf] object
    ///
    /// # Arguments
    ///
    /// * `path` - The path to use when reading the config file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // load from a file first
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Yaml))
            // then overlay any environment args ontop
            .add_source(
                config::Environment::with_prefix("sonar")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
