//! Service configuration loaded from TOML.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgis,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// GeoJSON boundary export for the memory backend
    pub boundaries_file: Option<PathBuf>,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            boundaries_file: None,
            database_url: None,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Disabled,
    #[default]
    Memory,
    Sled,
}

impl std::str::FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(CacheBackend::Disabled),
            "memory" => Ok(CacheBackend::Memory),
            "sled" => Ok(CacheBackend::Sled),
            other => bail!("unknown cache backend '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for the sled backend
    pub path: Option<PathBuf>,
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: None,
            timeout_ms: 250,
        }
    }
}

impl CacheConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Reject combinations that cannot start.
    pub fn validate(&self) -> Result<()> {
        match self.store.backend {
            StoreBackend::Memory if self.store.boundaries_file.is_none() => {
                bail!("store.boundaries_file is required for the memory store")
            }
            StoreBackend::Postgis if self.store.database_url.is_none() => {
                bail!("store.database_url is required for the postgis store")
            }
            StoreBackend::Postgis if self.store.max_connections == 0 => {
                bail!("store.max_connections must be at least 1")
            }
            _ => {}
        }

        if self.cache.backend == CacheBackend::Sled && self.cache.path.is_none() {
            bail!("cache.path is required for the sled cache");
        }
        if self.cache.timeout_ms == 0 {
            bail!("cache.timeout_ms must be positive");
        }
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be positive");
        }

        Ok(())
    }
}
