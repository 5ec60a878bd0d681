use alloy::primitives::Address;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid address in {0}: {1}")]
    BadAddress(&'static str, String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub social: SocialConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// WebSocket RPC endpoint for the new-block feed.
    #[serde(default)]
    pub ws_url: String,
    /// Address of the internal-transfer contract whose calls wrap a join.
    #[serde(default)]
    pub internal_transfer_contract: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    /// Profile-lookup API base URL (address -> social handle).
    #[serde(default = "default_profile_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    /// Social-network API base URL (handle -> account metadata).
    #[serde(default = "default_social_url")]
    pub api_url: String,
    /// App-only bearer token - loaded from env TWITTER_BEARER_TOKEN.
    #[serde(default)]
    pub bearer_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    /// Bot credential - loaded from env TELEGRAM_TOKEN.
    #[serde(default)]
    pub bot_token: String,
    /// Destination chat - loaded from env CHAT_ID.
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Minimum follower count for an alert (inclusive).
    #[serde(default = "default_follower_threshold")]
    pub follower_threshold: u64,
    /// Log alerts instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_profile_url() -> String {
    "https://prod-api.kosetto.com".to_string()
}
fn default_social_url() -> String {
    "https://api.twitter.com".to_string()
}
fn default_follower_threshold() -> u64 {
    20_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_url: default_profile_url(),
        }
    }
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            api_url: default_social_url(),
            bearer_token: String::new(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            follower_threshold: default_follower_threshold(),
            dry_run: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Config {
            chain: ChainConfig::default(),
            profile: ProfileConfig::default(),
            social: SocialConfig::default(),
            telegram: TelegramConfig::default(),
            alerts: AlertConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.apply_env();
        config
    }

    /// Env vars override file values.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("INFURA_WSS_URL") {
            self.chain.ws_url = v;
        }
        if let Ok(v) = std::env::var("INTERNAL_TRANSFER_ETH_CA") {
            self.chain.internal_transfer_contract = v;
        }
        if let Ok(v) = std::env::var("PROFILE_API_URL") {
            self.profile.base_url = v;
        }
        if let Ok(v) = std::env::var("TWITTER_BEARER_TOKEN") {
            self.social.bearer_token = v;
        }
        if let Ok(v) = std::env::var("TELEGRAM_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Ok(v) = std::env::var("CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Ok(v) = std::env::var("FOLLOWER_THRESHOLD") {
            match v.parse() {
                Ok(threshold) => self.alerts.follower_threshold = threshold,
                Err(_) => warn!(
                    value = %v,
                    "ignoring unparseable FOLLOWER_THRESHOLD, keeping {}",
                    self.alerts.follower_threshold
                ),
            }
        }
    }

    /// Parse and check everything the monitor cannot start without.
    pub fn internal_transfer_address(&self) -> Result<Address, ConfigError> {
        if self.chain.internal_transfer_contract.is_empty() {
            return Err(ConfigError::Missing("chain.internal_transfer_contract"));
        }
        Address::from_str(&self.chain.internal_transfer_contract).map_err(|_| {
            ConfigError::BadAddress(
                "chain.internal_transfer_contract",
                self.chain.internal_transfer_contract.clone(),
            )
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.ws_url.is_empty() {
            return Err(ConfigError::Missing("chain.ws_url"));
        }
        self.internal_transfer_address()?;
        if self.social.bearer_token.is_empty() {
            return Err(ConfigError::Missing("social.bearer_token"));
        }
        if !self.alerts.dry_run {
            if self.telegram.bot_token.is_empty() {
                return Err(ConfigError::Missing("telegram.bot_token"));
            }
            if self.telegram.chat_id.is_empty() {
                return Err(ConfigError::Missing("telegram.chat_id"));
            }
        }
        Ok(())
    }
}
