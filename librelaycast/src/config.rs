//! Configuration management for Relaycast
//!
//! The configuration is read once at startup into an immutable [`Config`]
//! and handed to each component. Secrets can live in the TOML file or be
//! supplied through `TELEGRAM_BOT_TOKEN` / `OPENROUTER_API_KEY`, which win
//! over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Upper bound for the publishing interval (20 minutes)
pub const MAX_POST_INTERVAL_SECS: u64 = 1200;
pub const DEFAULT_POST_INTERVAL_SECS: u64 = 600;

pub const CONFIG_ENV: &str = "RELAYCAST_CONFIG";
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Destination channel for translated posts
    pub channel_id: i64,
    /// The only user allowed to issue bot commands
    pub admin_id: i64,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Seconds between publisher cycles, clamped to [`MAX_POST_INTERVAL_SECS`]
    pub post_interval: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            post_interval: DEFAULT_POST_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "mistralai/Mistral-Nemo-Instruct-2407".to_string(),
            api_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub accounts: Vec<String>,
    /// Profile pages are `base_url` + account
    pub base_url: String,
    /// Browserless instance used to render profile pages
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    /// Fixed wait for dynamic content before the DOM is captured
    pub settle_ms: u64,
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            accounts: vec![
                "TechCrunch".to_string(),
                "PopCrave".to_string(),
                "BusinessInsider".to_string(),
            ],
            base_url: "https://x.com/".to_string(),
            browserless_url: "http://localhost:3000".to_string(),
            browserless_token: None,
            settle_ms: 5000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/relaycast/x_posts.db".to_string(),
        }
    }
}

/// Just the `[database]` table; every other section is ignored
#[derive(Debug, Default, Deserialize)]
struct StoreSection {
    #[serde(default)]
    database: DatabaseConfig,
}

impl DatabaseConfig {
    /// Read the store location from the default config file
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Read the store location without requiring (or validating) secrets
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let section: StoreSection = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(section.database)
    }
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, applying env overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let mut config = Self::parse_raw(&content)?;
        config.apply_env_overrides();
        config.normalize()?;
        Ok(config)
    }

    /// Parse and validate a TOML document without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = Self::parse_raw(content)?;
        config.normalize()?;
        Ok(config)
    }

    fn parse_raw(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::ParseError)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_env(BOT_TOKEN_ENV) {
            self.telegram.bot_token = token;
        }
        if let Some(key) = non_empty_env(API_KEY_ENV) {
            self.translator.api_key = key;
        }
    }

    /// Validate required fields and clamp the interval
    fn normalize(&mut self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingField("telegram.bot_token".to_string()).into());
        }
        if self.translator.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("translator.api_key".to_string()).into());
        }
        if self.scheduling.post_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduling.post_interval".to_string(),
                reason: "must be at least 1 second".to_string(),
            }
            .into());
        }
        if self.collector.accounts.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "collector.accounts".to_string(),
                reason: "account names cannot be blank".to_string(),
            }
            .into());
        }

        if self.scheduling.post_interval > MAX_POST_INTERVAL_SECS {
            tracing::warn!(
                configured = self.scheduling.post_interval,
                max = MAX_POST_INTERVAL_SECS,
                "post_interval exceeds maximum, clamping"
            );
            self.scheduling.post_interval = MAX_POST_INTERVAL_SECS;
        }

        Ok(())
    }

    /// Effective delay between publisher cycles
    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(self.scheduling.post_interval)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the configuration file path under the XDG config directory
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("relaycast").join("config.toml"))
}
