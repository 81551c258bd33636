use config::{self, Environment, File};
use log::{debug, error};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::ObsError;

/// Prefix for environment overrides, e.g. `OBSVC__LISTEN_ADDR`
pub const ENV_PREFIX: &str = "OBSVC";

/// Service configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address the HTTP API listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Default listen address
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: LogLevel::default(),
        }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Load service configuration from a file, with environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ObsError> {
    load_config_with_env(
        path,
        Environment::with_prefix(ENV_PREFIX).separator("__"),
    )
}

fn load_config_with_env<P: AsRef<Path>>(
    path: P,
    env: Environment,
) -> Result<ServiceConfig, ObsError> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(ObsError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            error!("Configuration file has no extension");
            return Err(ObsError::Config(format!(
                "Configuration file has no extension: {}",
                path.display()
            )));
        }
    };

    let format = match extension.as_str() {
        "toml" => config::FileFormat::Toml,
        "json" => config::FileFormat::Json,
        "yaml" | "yml" => config::FileFormat::Yaml,
        format => {
            error!("Unsupported configuration format: {}", format);
            return Err(ObsError::Config(format!(
                "Unsupported config format: {}",
                format
            )));
        }
    };

    let config = config::Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(env)
        .build()
        .map_err(|e| ObsError::Config(e.to_string()))?;

    let result: ServiceConfig = config
        .try_deserialize()
        .map_err(|e| ObsError::Config(e.to_string()))?;

    debug!("Configuration loaded: {:?}", result);
    Ok(result)
}
