//! Configuration
//!
//! TOML configuration with `REALADDR__` environment overrides, e.g.
//! `REALADDR__LOG__LEVEL=debug` or `REALADDR__RESOLVER__WHITELIST=10.0.0.1,10.0.0.2`.

mod resolver;

use std::path::Path;

use config::{Environment, File, FileFormat};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

pub use resolver::{LogConfig, ResolverConfig};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "REALADDR";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub log: LogConfig,
}

/// Errors that can occur while loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration source could not be read or deserialized
    Load(config::ConfigError),
    /// Log level is not a valid filter directive
    InvalidLogLevel(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(e) => write!(f, "failed to load configuration: {}", e),
            ConfigError::InvalidLogLevel(msg) => write!(f, "invalid log level: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Load(e) => Some(e),
            ConfigError::InvalidLogLevel(_) => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Load(e)
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("resolver.whitelist")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl LogConfig {
    /// Build the log filter, preferring `RUST_LOG` over the configured level
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| ConfigError::InvalidLogLevel(format!("{}: {}", self.level, e)))
    }
}
