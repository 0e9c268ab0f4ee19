//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub usage: UsageConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma-separated list of allowed CORS origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. When unset the in-memory store is used.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Apply embedded migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_run_migrations() -> bool {
    true
}

/// Usage simulation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UsageConfig {
    /// Start the background auto-updater
    #[serde(default = "default_auto_update_enabled")]
    pub auto_update_enabled: bool,

    /// Seconds between auto-update passes
    #[serde(default = "default_auto_update_interval")]
    pub auto_update_interval_secs: u64,

    /// Days added to the reset date when consumption is reset
    #[serde(default = "default_reset_cycle_days")]
    pub reset_cycle_days: i64,

    /// Attempts for simulate/reset when a concurrent write is detected
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

fn default_auto_update_enabled() -> bool {
    true
}

fn default_auto_update_interval() -> u64 {
    30
}

fn default_reset_cycle_days() -> i64 {
    30
}

fn default_max_conflict_retries() -> u32 {
    3
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("usage.auto_update_enabled", true)?
            .set_default("usage.auto_update_interval_secs", 30)?
            .set_default("usage.reset_cycle_days", 30)?
            .set_default("usage.max_conflict_retries", 3)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with TELCOX_ prefix
            .add_source(
                Environment::with_prefix("TELCOX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // Support the conventional DATABASE_URL variable
        if app_config.database.url.is_none() {
            app_config.database.url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        }

        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("TELCOX").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            auto_update_enabled: default_auto_update_enabled(),
            auto_update_interval_secs: default_auto_update_interval(),
            reset_cycle_days: default_reset_cycle_days(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usage_config() {
        let config = UsageConfig::default();
        assert!(config.auto_update_enabled);
        assert_eq!(config.auto_update_interval_secs, 30);
        assert_eq!(config.reset_cycle_days, 30);
        assert_eq!(config.max_conflict_retries, 3);
    }
}
