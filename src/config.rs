use crate::models::DEFAULT_CATEGORY;
use crate::remote::http::{parse_base_url, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TRTODO_CLIENT_CONFIG";

const CONFIG_DIR: &str = "trtodo-client";
const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";
const DEFAULT_FETCH_LIMIT: u32 = 20;

pub const KEYS: &[&str] = &["api.base-url", "fetch-limit", "default-category", "session.path"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Could not determine the user's config directory")]
    NoConfigDir,
}

fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    parse_base_url(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidConfig(format!("api.base-url: {}", e)))
}

fn validate_fetch_limit(value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ConfigError::InvalidConfig(
            "fetch-limit must be a positive integer".to_string(),
        )),
    }
}

fn validate_category(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "default-category cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_session_path(path: &str) -> Result<PathBuf, ConfigError> {
    if path.contains('\0') {
        return Err(ConfigError::InvalidConfig(
            "Path contains invalid characters".to_string(),
        ));
    }
    if path.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "Path cannot be empty".to_string(),
        ));
    }
    Ok(PathBuf::from(shellexpand::tilde(path).into_owned()))
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_path: Option<String>,
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.api_base_url {
            validate_base_url(url)?;
        }
        if let Some(limit) = self.fetch_limit {
            validate_fetch_limit(&limit.to_string())?;
        }
        if let Some(ref category) = self.default_category {
            validate_category(category)?;
        }
        if let Some(ref path) = self.session_path {
            validate_session_path(path)?;
        }
        Ok(())
    }
}

/// Reads and writes the client config file and resolves effective settings.
pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Opens the config at `config_path`, then `$TRTODO_CLIENT_CONFIG`, then the
    /// user's config directory. A missing file means all defaults.
    pub fn new(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(p) if !p.is_empty() => PathBuf::from(p),
                _ => dirs::config_dir()
                    .ok_or(ConfigError::NoConfigDir)?
                    .join(CONFIG_DIR)
                    .join(CONFIG_FILE),
            },
        };
        Self::open(path)
    }

    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Config::default()
        };
        if let Err(e) = config.validate() {
            warn!(path = %path.display(), error = %e, "config file contains invalid values");
            return Err(e);
        }
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Explicitly configured value for `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let config = &self.config;
        Ok(match key {
            "api.base-url" => config.api_base_url.clone(),
            "fetch-limit" => config.fetch_limit.map(|v| v.to_string()),
            "default-category" => config.default_category.clone(),
            "session.path" => config.session_path.clone(),
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        match key {
            "api.base-url" => {
                validate_base_url(value)?;
                config.api_base_url = Some(value.trim().to_string());
            }
            "fetch-limit" => {
                config.fetch_limit = Some(validate_fetch_limit(value)?);
            }
            "default-category" => {
                validate_category(value)?;
                config.default_category = Some(value.to_string());
            }
            "session.path" => {
                let path = validate_session_path(value)?;
                config.session_path = Some(path.to_string_lossy().to_string());
            }
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        config.validate()?;
        self.config = config;
        self.save()
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "api.base-url" => self.config.api_base_url = None,
            "fetch-limit" => self.config.fetch_limit = None,
            "default-category" => self.config.default_category = None,
            "session.path" => self.config.session_path = None,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        self.save()
    }

    /// Every key with its effective value and whether that value is the default.
    pub fn list(&self) -> Vec<(String, String, bool)> {
        KEYS.iter()
            .map(|key| {
                let explicit = self.get(key).ok().flatten();
                let is_default = explicit.is_none();
                let value = match key {
                    &"api.base-url" => self.base_url(),
                    &"fetch-limit" => self.fetch_limit().to_string(),
                    &"default-category" => self.default_category(),
                    _ => self.session_path().to_string_lossy().to_string(),
                };
                (key.to_string(), value, is_default)
            })
            .collect()
    }

    pub fn base_url(&self) -> String {
        self.config
            .api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn fetch_limit(&self) -> u32 {
        self.config.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT)
    }

    pub fn default_category(&self) -> String {
        self.config
            .default_category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }

    /// Session file; defaults to a sibling of the config file.
    pub fn session_path(&self) -> PathBuf {
        match self.config.session_path {
            Some(ref p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
            None => self
                .path
                .parent()
                .map(|dir| dir.join(SESSION_FILE))
                .unwrap_or_else(|| PathBuf::from(SESSION_FILE)),
        }
    }
}
