use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{
    assets::{get_config_dir, get_default_config},
    registry::{DEFAULT_MODEL_KEY, ModelRegistry, ProviderEntry},
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// OpenAI-compatible endpoint that serves every completion request.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Literal key, or `env:NAME` to read it from the environment.
    pub api_key: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "env:OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Ansi,
    Plain,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub default_model: String,
    pub gateway: GatewayConfig,
    pub theme: Theme,
    pub refresh_per_second: u32,
    /// Built-in models plus the ones declared under `providers`.
    pub registry: ModelRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL_KEY.to_string(),
            gateway: GatewayConfig::default(),
            theme: Theme::default(),
            refresh_per_second: default_refresh_per_second(),
            registry: ModelRegistry::default(),
        }
    }
}

fn default_refresh_per_second() -> u32 {
    15
}

#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    default_model: Option<String>,
    gateway: Option<GatewayConfig>,
    theme: Option<Theme>,
    refresh_per_second: Option<u32>,
    #[serde(default)]
    providers: Vec<ProviderEntry>,
}

impl RawConfig {
    #[instrument]
    fn to_config(&self) -> Result<Config, ConfigError> {
        let refresh_per_second = self
            .refresh_per_second
            .unwrap_or_else(default_refresh_per_second);
        if refresh_per_second == 0 {
            return Err(ConfigError::Config(
                "'refresh_per_second' must be greater than zero".to_string(),
            ));
        }

        for provider in &self.providers {
            if provider.name.is_empty() || provider.name.contains('/') {
                return Err(ConfigError::Config(format!(
                    "Invalid provider name '{}'",
                    provider.name
                )));
            }
        }

        Ok(Config {
            default_model: self
                .default_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_KEY.to_string()),
            gateway: self.gateway.clone().unwrap_or_default(),
            theme: self.theme.unwrap_or_default(),
            refresh_per_second,
            registry: ModelRegistry::default().with_extra(&self.providers),
        })
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ConfigError> {
    let actual_path = config_path.unwrap_or_else(|| get_config_dir().join("litechat.yml"));

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let raw: RawConfig = if content.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(&content)?
    };
    raw.to_config()
}
