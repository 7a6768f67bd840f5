use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::remote::{RawgConfig, RAWG_MAX_PAGE_SIZE};
use crate::sync::SyncSettings;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Remote catalog. Without it the service answers from the local store only.
    #[serde(default)]
    pub rawg: Option<RawgConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("gamedex.db")
}

/// Cache-aside and import tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Synced games older than this are refreshed from the remote (0 disables).
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
    /// Remote page size used by bulk import (1-40).
    #[serde(default = "default_import_page_size")]
    pub import_page_size: u32,
    /// Upper bound for any single remote call.
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: default_stale_after_hours(),
            import_page_size: default_import_page_size(),
            remote_timeout_secs: default_remote_timeout_secs(),
        }
    }
}

fn default_stale_after_hours() -> u64 {
    168
}

fn default_import_page_size() -> u32 {
    RAWG_MAX_PAGE_SIZE
}

fn default_remote_timeout_secs() -> u64 {
    15
}

impl SyncConfig {
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            stale_after: Duration::from_secs(self.stale_after_hours * 3600),
            remote_timeout: Duration::from_secs(self.remote_timeout_secs),
            import_page_size: self.import_page_size,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rawg: Option<SanitizedRawgConfig>,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Sanitized RAWG config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRawgConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            rawg: config.rawg.as_ref().map(|r| SanitizedRawgConfig {
                api_key_configured: !r.api_key.trim().is_empty(),
                base_url: r.base_url.clone(),
                timeout_secs: r.timeout_secs,
            }),
            sync: config.sync.clone(),
            logging: config.logging.clone(),
        }
    }
}
