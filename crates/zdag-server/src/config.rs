//! Configuration management for the zdag server.
//!
//! Configuration is layered from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML, optional)
//! 3. Environment variables (override)
//!
//! Environment variables use the `ZDAG_` prefix and `__` between section and
//! key, so `ZDAG_ENGINE__MAX_PATHS=500` overrides `engine.max_paths`.
//!
//! # Example
//!
//! ```ignore
//! use zdag_server::config::ServerConfig;
//!
//! let config = ServerConfig::load("config.yaml")?;
//! let config = ServerConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use zdag_domain::resolver::{
    ResolverConfig, DEFAULT_MAX_PATHS, DEFAULT_MAX_PATH_LENGTH, DEFAULT_MAX_TREE_DEPTH,
    DEFAULT_MAX_TREE_NODES,
};

use crate::handlers::batch::MAX_BATCH_SIZE;

const ENV_PREFIX: &str = "ZDAG";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    /// Query and mutation limits for the relation graph.
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Whole-request timeout in seconds. Unset means no HTTP-level timeout;
    /// queries are still bounded by `engine.query_timeout_ms`.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: None,
            cors_enabled: true,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type. Only "memory" is available.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Relation graph engine settings.
///
/// # Example YAML Configuration
///
/// ```yaml
/// engine:
///   query_timeout_ms: 5000
///   max_check_depth: 64
///   deny_cycles: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineSettings {
    /// Budget for one read query.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Hop limit for checks. Unset searches the whole reachable graph.
    #[serde(default)]
    pub max_check_depth: Option<u32>,

    #[serde(default = "default_max_paths")]
    pub max_paths: usize,

    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,

    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: u32,

    #[serde(default = "default_max_tree_nodes")]
    pub max_tree_nodes: usize,

    /// Reject creates that would close a cycle in the relation graph.
    #[serde(default)]
    pub deny_cycles: bool,

    /// Operation limit for one batch request.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            max_check_depth: None,
            max_paths: default_max_paths(),
            max_path_length: default_max_path_length(),
            max_tree_depth: default_max_tree_depth(),
            max_tree_nodes: default_max_tree_nodes(),
            deny_cycles: false,
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl EngineSettings {
    /// Resolver limits described by these settings.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            timeout: Duration::from_millis(self.query_timeout_ms),
            max_check_depth: self.max_check_depth,
            max_paths: self.max_paths,
            max_path_length: self.max_path_length,
            max_tree_depth: self.max_tree_depth,
            max_tree_nodes: self.max_tree_nodes,
        }
    }
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

fn default_max_paths() -> usize {
    DEFAULT_MAX_PATHS
}

fn default_max_path_length() -> usize {
    DEFAULT_MAX_PATH_LENGTH
}

fn default_max_tree_depth() -> u32 {
    DEFAULT_MAX_TREE_DEPTH
}

fn default_max_tree_nodes() -> usize {
    DEFAULT_MAX_TREE_NODES
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn env_source() -> Environment {
    // ZDAG_SERVER__PORT -> server.port
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }

    /// Load configuration from defaults and `ZDAG_` environment variables.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }

    /// `load` when a path is given, `from_env` otherwise.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        fn invalid(message: impl Into<String>) -> Result<(), ConfigLoadError> {
            Err(ConfigLoadError::Invalid {
                message: message.into(),
            })
        }

        if self.server.port == 0 {
            return invalid("server.port must be greater than 0");
        }
        if self.server.max_body_bytes == 0 {
            return invalid("server.max_body_bytes must be greater than 0");
        }
        if self.server.request_timeout_secs == Some(0) {
            return invalid("server.request_timeout_secs must be greater than 0 when set");
        }

        let valid_backends = ["memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return invalid(format!(
                "storage.backend must be one of: {:?}, got: {}",
                valid_backends, self.storage.backend
            ));
        }

        let engine = &self.engine;
        let caps = [
            ("engine.query_timeout_ms", engine.query_timeout_ms as usize),
            ("engine.max_paths", engine.max_paths),
            ("engine.max_path_length", engine.max_path_length),
            ("engine.max_tree_depth", engine.max_tree_depth as usize),
            ("engine.max_tree_nodes", engine.max_tree_nodes),
            ("engine.max_batch_size", engine.max_batch_size),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, value)| *value == 0) {
            return invalid(format!("{name} must be greater than 0"));
        }
        if engine.max_check_depth == Some(0) {
            return invalid("engine.max_check_depth must be greater than 0 when set");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return invalid(format!(
                "logging.level must be one of: {:?}, got: {}",
                valid_levels, self.logging.level
            ));
        }

        Ok(())
    }
}
