//! Application configuration from the environment

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const ENV_HOST: &str = "FINBOARD_HOST";
pub const ENV_PORT: &str = "FINBOARD_PORT";
pub const ENV_DATA_DIR: &str = "FINBOARD_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read `FINBOARD_*` variables over the
    /// defaults
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_PORT, port))?;
        }
        if let Some(data_dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }

    /// Apply command-line overrides
    pub fn merge(mut self, host: Option<String>, port: Option<u16>, data_dir: Option<PathBuf>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
