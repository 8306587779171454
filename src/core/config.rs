use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogProviderConfig {
    pub store_url: String,
    pub api_url: String,
    /// Country code the store prices in; must resolve to the reference currency.
    #[serde(default = "default_country")]
    pub country: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateProviderConfig {
    pub base_url: String,
    /// Seconds a fetched rate is reused. Zero disables rate caching.
    #[serde(default)]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub catalog: CatalogProviderConfig,
    pub rates: RateProviderConfig,
}

fn default_country() -> String {
    "us".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            catalog: CatalogProviderConfig {
                store_url: "https://store.steampowered.com".to_string(),
                api_url: "https://api.steampowered.com".to_string(),
                country: default_country(),
            },
            rates: RateProviderConfig {
                base_url: "http://localhost:8888".to_string(),
                cache_ttl_secs: 0,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "gameprice", "gameprice")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "gameprice", "gameprice")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_cache_ttl(&self) -> Option<Duration> {
        match self.providers.rates.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // a zero timeout would fail every upstream call
        ensure!(
            self.upstream_timeout_secs > 0,
            "upstream_timeout_secs must be greater than zero"
        );
        Ok(())
    }
}
