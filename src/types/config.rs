//! Configuration for georesolver.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ResolverResult;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "georesolver.toml";

/// Environment variables that override `provider.api_key`, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEORESOLVER_API_KEY", "GOOGLE_MAPS_API_KEY"];

/// Main configuration for georesolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Geocoding provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Lookup behaviour (retries, thresholds).
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Connectivity probe settings.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Geocoding provider settings (Google Maps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key. Overridden by `GEORESOLVER_API_KEY` / `GOOGLE_MAPS_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the Maps web services.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Region bias (ccTLD).
    #[serde(default = "default_region")]
    pub region: String,

    /// Response language.
    #[serde(default = "default_language")]
    pub language: String,

    /// Place types requested from autocomplete.
    #[serde(default = "default_suggestion_types")]
    pub suggestion_types: String,

    /// Timeout for each provider call (in seconds).
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            region: default_region(),
            language: default_language(),
            suggestion_types: default_suggestion_types(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_region() -> String {
    "br".to_string()
}

fn default_language() -> String {
    "pt-BR".to_string()
}

fn default_suggestion_types() -> String {
    "address".to_string()
}

fn default_request_timeout() -> u64 {
    8
}

/// Lookup behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Retries after the first reverse-geocoding attempt on transport failure.
    #[serde(default = "default_reverse_retries")]
    pub reverse_retries: u32,

    /// Fixed delay between reverse-geocoding attempts (in milliseconds).
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Minimum input length before suggestions are requested.
    #[serde(default = "default_min_suggestion_chars")]
    pub min_suggestion_chars: usize,
}

impl ResolverConfig {
    /// Retry delay as a [`Duration`].
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reverse_retries: default_reverse_retries(),
            retry_delay_ms: default_retry_delay(),
            min_suggestion_chars: default_min_suggestion_chars(),
        }
    }
}

fn default_reverse_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_min_suggestion_chars() -> usize {
    3
}

/// Where cached lookups are stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// In-process, lost on exit.
    Memory,
    /// SQLite file at `cache.db_path`.
    Sqlite,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Storage backend.
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum number of stored entries across all namespaces.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Time to live of geocoding entries (forward and reverse), in seconds.
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_secs: u64,

    /// Time to live of suggestion entries, in seconds.
    #[serde(default = "default_suggestion_ttl")]
    pub suggestion_ttl_secs: u64,
}

impl CacheConfig {
    pub fn geocode_ttl(&self) -> Duration {
        Duration::from_secs(self.geocode_ttl_secs)
    }

    pub fn suggestion_ttl(&self) -> Duration {
        Duration::from_secs(self.suggestion_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            db_path: default_db_path(),
            max_entries: default_max_entries(),
            geocode_ttl_secs: default_geocode_ttl(),
            suggestion_ttl_secs: default_suggestion_ttl(),
        }
    }
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".georesolver/cache.db")
}

fn default_max_entries() -> usize {
    5000
}

fn default_geocode_ttl() -> u64 {
    24 * 60 * 60
}

fn default_suggestion_ttl() -> u64 {
    60 * 60
}

/// Connectivity probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// When disabled the resolver assumes it is always online.
    #[serde(default = "default_true")]
    pub probe_enabled: bool,

    /// `host:port` opened by the TCP probe.
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,

    /// Probe timeout (in milliseconds).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl NetworkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_addr: default_probe_addr(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_probe_addr() -> String {
    "maps.googleapis.com:443".to_string()
}

fn default_probe_timeout() -> u64 {
    1500
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ResolverResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ResolverResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            provider: ProviderConfig::default(),
            resolver: ResolverConfig::default(),
            cache: CacheConfig::default(),
            network: NetworkConfig::default(),
        }
    }

    /// Tries the current directory, then the user config directory, then defaults.
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::load(CONFIG_FILE_NAME) {
            return config;
        }
        Self::user_config_path()
            .and_then(|path| Self::load(path).ok())
            .unwrap_or_else(Self::default_config)
    }

    /// `~/.config/georesolver/georesolver.toml` (platform dependent).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("georesolver").join(CONFIG_FILE_NAME))
    }

    /// Applies the API key from the environment, if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
        {
            self.provider.api_key = key;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default_config();
        assert_eq!(config.provider.timeout(), Duration::from_secs(8));
        assert_eq!(config.resolver.reverse_retries, 2);
        assert_eq!(config.resolver.min_suggestion_chars, 3);
        assert_eq!(config.cache.geocode_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.cache.suggestion_ttl(), Duration::from_secs(3_600));
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert!(!config.provider.has_api_key());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml = r#"
            [provider]
            api_key = "abc"
            region = "pt"

            [cache]
            backend = "memory"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.api_key, "abc");
        assert_eq!(config.provider.region, "pt");
        assert_eq!(config.provider.language, "pt-BR");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.max_entries, 5000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default_config();
        config.resolver.retry_delay_ms = 250;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.resolver.retry_delay(), Duration::from_millis(250));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[provider]"));
        assert!(content.contains("[cache]"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Config::load("/nonexistent/georesolver.toml").is_err());
    }
}
