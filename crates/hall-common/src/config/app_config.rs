//! Application configuration structs
//!
//! Loads configuration from environment variables (prefixed `HALL_`), with
//! sensible defaults for every tunable.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub chat: ChatConfig,
    pub billing: BillingConfig,
    pub session: SessionConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Chat engine tunables
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Network window for the group room (messages)
    #[serde(default = "default_group_window")]
    pub group_window: usize,
    /// Network window for pairwise rooms (messages)
    #[serde(default = "default_private_window")]
    pub private_window: usize,
    /// Display-count start and "load older" increment
    #[serde(default = "default_display_page")]
    pub display_page: usize,
    /// Recipients per unread fan-out batch
    #[serde(default = "default_fanout_chunk")]
    pub fanout_chunk: usize,
    /// Minimum interval between typing-indicator writes (ms)
    #[serde(default = "default_typing_throttle_ms")]
    pub typing_throttle_ms: u64,
    /// Writer-side typing self-clear delay (ms)
    #[serde(default = "default_typing_clear_ms")]
    pub typing_clear_ms: u64,
    /// Presence-list batching flush interval (ms, one UI frame)
    #[serde(default = "default_presence_flush_ms")]
    pub presence_flush_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            group_window: default_group_window(),
            private_window: default_private_window(),
            display_page: default_display_page(),
            fanout_chunk: default_fanout_chunk(),
            typing_throttle_ms: default_typing_throttle_ms(),
            typing_clear_ms: default_typing_clear_ms(),
            presence_flush_ms: default_presence_flush_ms(),
        }
    }
}

/// Billing tunables
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Length of one billing period in days (also the initial grace period)
    #[serde(default = "default_period_days")]
    pub period_days: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
        }
    }
}

/// Session/bootstrap tunables
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Safety timeout for the backend "ready" signal at startup (seconds)
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "studyhall".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_group_window() -> usize {
    1200
}

fn default_private_window() -> usize {
    600
}

fn default_display_page() -> usize {
    200
}

fn default_fanout_chunk() -> usize {
    25
}

fn default_typing_throttle_ms() -> u64 {
    450
}

fn default_typing_clear_ms() -> u64 {
    3000
}

fn default_presence_flush_ms() -> u64 {
    16
}

fn default_period_days() -> i64 {
    30
}

fn default_ready_timeout_secs() -> u64 {
    12
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            chat: ChatConfig::default(),
            billing: BillingConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default; a variable that is present but
    /// unparsable is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("HALL_APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: match env::var("HALL_APP_ENV").ok().as_deref() {
                    None => default_env(),
                    Some("production") => Environment::Production,
                    Some("staging") => Environment::Staging,
                    Some("development") => Environment::Development,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue("HALL_APP_ENV", other.to_owned()))
                    }
                },
            },
            chat: ChatConfig {
                group_window: parse_var("HALL_CHAT_GROUP_WINDOW")?
                    .unwrap_or_else(default_group_window),
                private_window: parse_var("HALL_CHAT_PRIVATE_WINDOW")?
                    .unwrap_or_else(default_private_window),
                display_page: parse_var("HALL_CHAT_DISPLAY_PAGE")?
                    .unwrap_or_else(default_display_page),
                fanout_chunk: parse_var("HALL_CHAT_FANOUT_CHUNK")?
                    .unwrap_or_else(default_fanout_chunk),
                typing_throttle_ms: parse_var("HALL_CHAT_TYPING_THROTTLE_MS")?
                    .unwrap_or_else(default_typing_throttle_ms),
                typing_clear_ms: parse_var("HALL_CHAT_TYPING_CLEAR_MS")?
                    .unwrap_or_else(default_typing_clear_ms),
                presence_flush_ms: parse_var("HALL_CHAT_PRESENCE_FLUSH_MS")?
                    .unwrap_or_else(default_presence_flush_ms),
            },
            billing: BillingConfig {
                period_days: parse_var("HALL_BILLING_PERIOD_DAYS")?
                    .unwrap_or_else(default_period_days),
            },
            session: SessionConfig {
                ready_timeout_secs: parse_var("HALL_SESSION_READY_TIMEOUT_SECS")?
                    .unwrap_or_else(default_ready_timeout_secs),
            },
        })
    }
}

/// Read and parse one environment variable; absent is `None`, unparsable is
/// an error.
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
