use std::fs;
use std::path::Path;
use std::time::Duration;

use biblestudy_sdk::verse::{DEFAULT_TRANSLATION, DEFAULT_VERSE_API_URL};
use biblestudy_sdk::{Address, LedgerObjects};
use biblestudy_types::{CLOCK_OBJECT_ID, MIN_GAS_BALANCE_MIST};
use serde::{Deserialize, Serialize};

use crate::error::{WatcherError, WatcherResult};

/// Watcher configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    /// Sui fullnode JSON-RPC endpoint
    pub rpc_url: String,

    /// Published package containing the `biblestudy` module
    pub package_id: Address,

    /// Shared object tracking today's claims
    pub claims_id: Address,

    /// Shared object holding per-user weekly progress
    pub progress_registry_id: Address,

    /// Ledger clock object
    #[serde(default = "default_clock_id")]
    pub clock_id: Address,

    /// Identity to watch when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Address>,

    /// Status and weekly refresh interval in seconds
    pub poll_interval_secs: u64,

    /// Wait after a successful claim before re-reading the week (milliseconds)
    pub settle_delay_ms: u64,

    /// Gas balance below which the account is reported low (MIST)
    pub min_gas_balance_mist: u64,

    /// HTTP read timeout in seconds
    pub request_timeout_secs: u64,

    /// Verse text service
    pub verse: VerseConfig,

    /// Retry configuration for the initial status check
    pub retry: RetryConfig,
}

/// Verse text service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerseConfig {
    pub api_url: String,
    pub translation: String,
}

/// Retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum number of retries for failed operations
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

fn default_clock_id() -> Address {
    let mut bytes = [0u8; Address::LENGTH];
    bytes[Address::LENGTH - 1] = 0x06;
    Address::new(bytes)
}

fn invalid(field: &str, value: impl std::fmt::Display, expected: &str) -> WatcherError {
    WatcherError::InvalidConfig(format!("{} = {}, expected {}", field, value, expected))
}

impl WatcherConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> WatcherResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            WatcherError::Io(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: WatcherConfig = toml::from_str(&content).map_err(|e| {
            WatcherError::SerializationError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> WatcherResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            WatcherError::Io(format!("Failed to write config file {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> WatcherResult<()> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(invalid("rpc_url", &self.rpc_url, "an http(s) URL"));
        }

        let unset = Address::new([0u8; Address::LENGTH]);
        for (field, id) in [
            ("package_id", &self.package_id),
            ("claims_id", &self.claims_id),
            ("progress_registry_id", &self.progress_registry_id),
        ] {
            if *id == unset {
                return Err(invalid(field, id, "a deployed object ID"));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", 0, "greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", 0, "greater than 0"));
        }

        if self.verse.api_url.is_empty() {
            return Err(invalid("verse.api_url", "\"\"", "a non-empty URL"));
        }

        self.retry.validate()?;

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ledger_objects(&self) -> LedgerObjects {
        LedgerObjects {
            package_id: self.package_id,
            claims_id: self.claims_id,
            progress_registry_id: self.progress_registry_id,
            clock_id: self.clock_id,
        }
    }
}

impl RetryConfig {
    /// Validate retry configuration
    fn validate(&self) -> WatcherResult<()> {
        if self.base_delay_ms == 0 {
            return Err(invalid("retry.base_delay_ms", 0, "greater than 0"));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(invalid(
                "retry.max_delay_ms",
                self.max_delay_ms,
                &format!("at least base_delay_ms ({})", self.base_delay_ms),
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(invalid(
                "retry.backoff_multiplier",
                self.backoff_multiplier,
                "at least 1.0",
            ));
        }

        Ok(())
    }

    /// Calculate delay for retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.base_delay_ms);
        }

        let exponential_delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::from_millis((exponential_delay as u64).min(self.max_delay_ms))
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://fullnode.testnet.sui.io:443".to_string(),
            package_id: Address::new([0u8; Address::LENGTH]),
            claims_id: Address::new([0u8; Address::LENGTH]),
            progress_registry_id: Address::new([0u8; Address::LENGTH]),
            clock_id: default_clock_id(),
            identity: None,
            poll_interval_secs: 5,
            settle_delay_ms: 2_000,
            min_gas_balance_mist: MIN_GAS_BALANCE_MIST,
            request_timeout_secs: 30,
            verse: VerseConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for VerseConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_VERSE_API_URL.to_string(),
            translation: DEFAULT_TRANSLATION.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: impl AsRef<Path>) -> WatcherResult<()> {
    let example_config = WatcherConfig {
        package_id: "0x8f2d4c1a9b7e6f3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d4c3b2a1f0e9d"
            .parse()
            .map_err(WatcherError::Sdk)?,
        claims_id: "0x3c6a1f0e2b9d8c7a6f5e4d3c2b1a0f9e8d7c6b5a4f3e2d1c0b9a8f7e6d5c4b3a"
            .parse()
            .map_err(WatcherError::Sdk)?,
        progress_registry_id: "0x5e9b2d7c4a1f8e3b6d0c9a2f5e8b1d4c7a0f3e6b9d2c5a8f1e4b7d0c3a6f9e2b"
            .parse()
            .map_err(WatcherError::Sdk)?,
        clock_id: CLOCK_OBJECT_ID.parse().map_err(WatcherError::Sdk)?,
        ..WatcherConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}
