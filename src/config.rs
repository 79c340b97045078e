use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// JSON-RPC transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Node RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of attempts per request
    pub max_retries: u32,
    /// Initial retry delay in seconds
    pub retry_delay_seconds: u64,
    /// Maximum retry delay in seconds
    pub max_retry_delay_seconds: u64,
}

/// Which ledger to talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Group passed as the first parameter of every RPC call
    pub group_id: u64,
    /// Expected chain id
    pub chain_id: u64,
    /// Follow the node across chain changes instead of failing
    pub any_network: bool,
}

/// Event polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Poll interval in milliseconds
    pub interval_ms: u64,
    /// Height jump above which intermediate block events are skipped
    pub block_skew_threshold: u64,
    /// Blocks an eviction entry is kept for
    pub retention_blocks: u64,
    /// Widest block range requested per log query
    pub max_filter_block_range: u64,
    /// How long a fetched height is reused, in milliseconds
    pub fast_block_max_age_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
            max_retry_delay_seconds: 30,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            group_id: 1,
            chain_id: 1,
            any_network: false,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 4000,
            block_skew_threshold: 1000,
            retention_blocks: 12,
            max_filter_block_range: 10,
            fast_block_max_age_ms: 2100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE`
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "ledger.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // RPC configuration
        if let Ok(endpoint) = env::var("LEDGER_RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(timeout) = env_parse("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }
        if let Some(retries) = env_parse("RPC_MAX_RETRIES")? {
            self.rpc.max_retries = retries;
        }

        // Chain configuration
        if let Some(group_id) = env_parse("LEDGER_GROUP_ID")? {
            self.chain.group_id = group_id;
        }
        if let Some(chain_id) = env_parse("LEDGER_CHAIN_ID")? {
            self.chain.chain_id = chain_id;
        }
        if let Some(any_network) = env_parse("LEDGER_ANY_NETWORK")? {
            self.chain.any_network = any_network;
        }

        if let Some(interval) = env_parse("POLL_INTERVAL_MS")? {
            self.polling.interval_ms = interval;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        if self.rpc.max_retries == 0 || self.rpc.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.max_retries".to_string(),
                value: self.rpc.max_retries.to_string(),
            });
        }

        if self.polling.interval_ms < 100 || self.polling.interval_ms > 600_000 {
            return Err(ConfigError::InvalidValue {
                key: "polling.interval_ms".to_string(),
                value: self.polling.interval_ms.to_string(),
            });
        }

        if self.polling.block_skew_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "polling.block_skew_threshold".to_string(),
                value: self.polling.block_skew_threshold.to_string(),
            });
        }

        if self.polling.max_filter_block_range == 0 {
            return Err(ConfigError::InvalidValue {
                key: "polling.max_filter_block_range".to_string(),
                value: self.polling.max_filter_block_range.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content).map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }
}
