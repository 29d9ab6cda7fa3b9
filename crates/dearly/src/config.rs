//! Client configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client configuration: where the gateways and the hosted store live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the gateway server.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Base URL of the hosted diary store.
    #[serde(default)]
    pub store_url: String,

    /// Public client key for the hosted store.
    #[serde(default)]
    pub store_api_key: String,
}

fn default_gateway_url() -> String {
    "http://localhost:8787".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            store_url: String::new(),
            store_api_key: String::new(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no config directory available")?;
        Ok(base.join("dearly").join("config.toml"))
    }

    /// Load the config file if present, then apply flag/env overrides.
    pub fn resolve(
        path: Option<&Path>,
        gateway_url: Option<String>,
        store_url: Option<String>,
        store_api_key: Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_path()?;
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(url) = gateway_url {
            config.gateway_url = url;
        }
        if let Some(url) = store_url {
            config.store_url = url;
        }
        if let Some(key) = store_api_key {
            config.store_api_key = key;
        }
        Ok(config)
    }
}
