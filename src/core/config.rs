use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BUNDESBANK_URL: &str = "https://api.statistiken.bundesbank.de/rest/download/";
pub const DEFAULT_SERIES_PATH: &str = "BBEX3/D.{currency}.EUR.BB.AC.000";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BundesbankProviderConfig {
    pub base_url: String,
    /// Path below `base_url`; `{currency}` is replaced by the currency code.
    pub series_path: String,
    pub format: String,
    pub lang: String,
}

impl Default for BundesbankProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BUNDESBANK_URL.to_string(),
            series_path: DEFAULT_SERIES_PATH.to_string(),
            format: "sdmx".to_string(),
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub bundesbank: BundesbankProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2_000,
        }
    }
}

fn default_max_concurrent_fetches() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currencies: Vec::new(),
            providers: ProvidersConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "fxref", "fxref")
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

    /// Writes the configuration as YAML, creating parent directories.
    pub fn save_to_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let config_str = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, config_str)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }
}
