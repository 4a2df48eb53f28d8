//! Server configuration

use anyhow::Context;
use orange_bridge::EngineConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Name of the optional configuration file inside the config directory
pub const CONFIG_FILE: &str = "orange.toml";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server bind address
    pub addr: SocketAddr,
    /// Compiled front-end served for every non-API path
    pub dist_dir: PathBuf,
    /// Native engine settings
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            dist_dir: PathBuf::from("../frontend/dist"),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load `orange.toml` from `config_dir`.
    ///
    /// Returns None if the file doesn't exist or can't be parsed.
    pub fn from_file(config_dir: impl AsRef<Path>) -> Option<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("Config file not found: {:?}", config_path);
            return None;
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {:?}", config_path);
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file {:?}: {}", config_path, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    /// Load configuration from environment variables and config file
    /// Priority: Environment variables > config file > defaults
    pub fn load(config_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = Self::from_file(config_dir).unwrap_or_default();
        config.apply_env()
    }

    /// Overlay `ORANGE_ADDR`, `ORANGE_DIST_DIR` and the engine variables
    pub fn apply_env(mut self) -> anyhow::Result<Self> {
        if let Ok(addr) = std::env::var("ORANGE_ADDR") {
            self.addr = addr
                .parse()
                .with_context(|| format!("Invalid ORANGE_ADDR '{}'", addr))?;
        }

        if let Ok(dist_dir) = std::env::var("ORANGE_DIST_DIR") {
            self.dist_dir = PathBuf::from(dist_dir);
        }

        self.engine = self.engine.apply_env();
        Ok(self)
    }

    /// Set a new bind address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set an explicit engine library path
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine = self.engine.with_library_path(path);
        self
    }
}
