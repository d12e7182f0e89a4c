//! Configuration loading

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, BillingConfig, ChatConfig, ConfigError, Environment, SessionConfig,
};
