//! Configuration for the token engine

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address
    pub http_listen_addr: String,

    /// Earning configuration
    pub earning: EarningConfig,

    /// Breach gateway configuration
    pub breach: BreachConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "tracker-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            http_listen_addr: "0.0.0.0:8080".to_string(),
            earning: EarningConfig::default(),
            breach: BreachConfig::default(),
        }
    }
}

/// Token earning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningConfig {
    /// Tokens minted per blocked tracker
    pub tracker_blocked_rate: Decimal,

    /// Tokens minted on registration
    pub welcome_bonus: Decimal,
}

impl Default for EarningConfig {
    fn default() -> Self {
        Self {
            tracker_blocked_rate: dec!(0.01),
            welcome_bonus: dec!(10),
        }
    }
}

/// Breach gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachConfig {
    /// Range endpoint base URL
    pub base_url: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Hash prefix length disclosed to the provider
    pub hash_prefix_len: usize,

    /// User agent sent with range requests
    pub user_agent: String,
}

impl Default for BreachConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.breachfeeds.example".to_string(),
            timeout_ms: 5_000,
            hash_prefix_len: 5,
            user_agent: format!("tracker-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("TRACKER_HTTP_ADDR") {
            config.http_listen_addr = addr;
        }

        if let Ok(rate) = std::env::var("TRACKER_BLOCKED_RATE") {
            config.earning.tracker_blocked_rate = rate
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid TRACKER_BLOCKED_RATE: {}", e)))?;
        }

        if let Ok(bonus) = std::env::var("TRACKER_WELCOME_BONUS") {
            config.earning.welcome_bonus = bonus
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid TRACKER_WELCOME_BONUS: {}", e)))?;
        }

        if let Ok(url) = std::env::var("TRACKER_BREACH_URL") {
            config.breach.base_url = url;
        }

        if let Ok(timeout) = std::env::var("TRACKER_BREACH_TIMEOUT_MS") {
            config.breach.timeout_ms = timeout.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid TRACKER_BREACH_TIMEOUT_MS: {}", e))
            })?;
        }

        Ok(config)
    }
}
