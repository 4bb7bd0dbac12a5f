use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub coingecko: CoinGeckoConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Fixes the train/test shuffle. Unset means a fresh split on every render.
    #[serde(default)]
    pub split_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub table_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_test_fraction() -> f64 {
    0.2
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            split_seed: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { table_rows: 5 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CoinGeckoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid server address {}:{}", self.bind, self.port))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.coingecko.base_url).with_context(|| {
            format!(
                "coingecko.base_url '{}' is not a valid URL",
                self.coingecko.base_url
            )
        })?;
        if self.coingecko.timeout_secs == 0 {
            bail!("coingecko.timeout_secs must be > 0");
        }
        let frac = self.model.test_fraction;
        if !(frac > 0.0 && frac < 1.0) {
            bail!("model.test_fraction must be within (0, 1), got {}", frac);
        }
        if self.ui.table_rows == 0 {
            bail!("ui.table_rows must be > 0");
        }
        if self.server.port == 0 {
            bail!("server.port must be > 0");
        }
        self.server
            .socket_addr()
            .context("server section is invalid")?;
        Ok(())
    }
}
