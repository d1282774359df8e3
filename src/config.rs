//! Client configuration: service URL and bearer credential
//!
//! Resolution order is flag, then environment, then config file. The
//! config file is optional; the URL and token themselves are not.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the service URL
pub const API_URL_ENV: &str = "FABULA_API_URL";
/// Environment variable overriding the bearer token
pub const TOKEN_ENV: &str = "FABULA_TOKEN";

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no API URL configured (--api-url, {API_URL_ENV}, or config file)")]
    MissingApiUrl,

    #[error("no API token configured (--token, {TOKEN_ENV}, or config file)")]
    MissingToken,
}

/// On-disk config shape; every field optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    token: Option<String>,
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: String,
}

/// Default config file path (~/.config/fabula/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fabula")
        .join("config.toml")
}

impl Config {
    /// Resolve configuration from flags, environment, and config file
    pub fn resolve(
        api_url: Option<String>,
        token: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or_else(default_config_path);
        let file = load_file(&path)?;

        let api_url = api_url
            .or_else(|| std::env::var(API_URL_ENV).ok())
            .or(file.api_url)
            .ok_or(ConfigError::MissingApiUrl)?;
        let token = token
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .or(file.token)
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self { api_url, token })
    }
}

fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
