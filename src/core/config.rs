use crate::core::converter::ConverterSettings;
use crate::providers::caching::CachePolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "FXCONV_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.currencybeacon.com/v1".to_string()
}

fn default_retries() -> usize {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            api_key: String::new(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ProviderConfig {
    /// The configured key, or the one from the environment when none is set.
    pub fn resolved_api_key(&self) -> String {
        if self.api_key.is_empty() {
            std::env::var(API_KEY_ENV).unwrap_or_default()
        } else {
            self.api_key.clone()
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConverterConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_first_currency")]
    pub first_currency: String,
    #[serde(default = "default_second_currency")]
    pub second_currency: String,
    #[serde(default)]
    pub first_amount: String,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_first_currency() -> String {
    "USD".to_string()
}

fn default_second_currency() -> String {
    "EUR".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            debounce_ms: default_debounce_ms(),
            first_currency: default_first_currency(),
            second_currency: default_second_currency(),
            first_amount: String::new(),
        }
    }
}

impl ConverterConfig {
    pub fn settings(&self) -> ConverterSettings {
        ConverterSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            first_currency: self.first_currency.clone(),
            second_currency: self.second_currency.clone(),
            first_amount: self.first_amount.clone(),
        }
    }
}

/// Freshness and eviction windows, in seconds.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_currencies_stale_secs")]
    pub currencies_stale_secs: u64,
    #[serde(default = "default_conversion_stale_secs")]
    pub conversion_stale_secs: u64,
    #[serde(default = "default_gc_secs")]
    pub gc_secs: u64,
}

fn default_currencies_stale_secs() -> u64 {
    60 * 60
}

fn default_conversion_stale_secs() -> u64 {
    2 * 60
}

fn default_gc_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            currencies_stale_secs: default_currencies_stale_secs(),
            conversion_stale_secs: default_conversion_stale_secs(),
            gc_secs: default_gc_secs(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            currencies_ttl: Duration::from_secs(self.currencies_stale_secs),
            conversion_ttl: Duration::from_secs(self.conversion_stale_secs),
            gc_after: Duration::from_secs(self.gc_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
