use anyhow::Result;
use autopay_core::{ConfigError, WorkerConfig};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Prefix of environment overrides, e.g. `PI_WALLET_HORIZON_URL`.
pub const ENV_PREFIX: &str = "PI_WALLET";

/// Horizon caps page size at 200.
const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Debug, Deserialize, Clone)]
pub struct PiConfig {
    #[serde(default = "default_horizon_url")]
    pub horizon_url: String,
    #[serde(default = "default_network_passphrase")]
    pub network_passphrase: String,
    /// Stroops per operation.
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default = "default_coin_type")]
    pub coin_type: u32,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_horizon_url() -> String {
    "https://api.mainnet.minepi.com".to_string()
}

fn default_network_passphrase() -> String {
    "Pi Mainnet".to_string()
}

fn default_base_fee() -> u32 {
    100
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_history_limit() -> u32 {
    5
}

fn default_coin_type() -> u32 {
    crate::keys::STELLAR_COIN_TYPE
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            horizon_url: default_horizon_url(),
            network_passphrase: default_network_passphrase(),
            base_fee: default_base_fee(),
            tick_interval_ms: default_tick_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            history_limit: default_history_limit(),
            coin_type: default_coin_type(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl PiConfig {
    /// Loads `path` (optional) and then `PI_WALLET_*` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: PiConfig = settings.try_deserialize().map_err(|e| anyhow::anyhow!(e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizon_url.starts_with("http://") || self.horizon_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid(
                "horizon_url",
                format!("'{}' is not an http(s) url", self.horizon_url),
            ));
        }
        if self.network_passphrase.is_empty() {
            return Err(ConfigError::missing("network_passphrase"));
        }
        if self.base_fee == 0 {
            return Err(ConfigError::invalid("base_fee", "must be at least 1 stroop"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms", "must be positive"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("request_timeout_ms", "must be positive"));
        }
        if self.history_limit == 0 || self.history_limit > MAX_HISTORY_LIMIT {
            return Err(ConfigError::invalid(
                "history_limit",
                format!("must be between 1 and {}", MAX_HISTORY_LIMIT),
            ));
        }
        Ok(())
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new(
            Duration::from_millis(self.tick_interval_ms),
            Duration::from_millis(self.request_timeout_ms),
        )
    }
}
