//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Nothing here is secret (the upstream page is public), so values
//! live in the file directly, with serde defaults for everything that
//! has a sensible one.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub tax: TaxConfig,
}

/// Which page to fetch and how.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: String,
    /// "http" (plain GET) or "browser" (WebDriver session).
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Upper bound for the HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for the browser's anchor-element wait.
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
    /// WebDriver endpoint, required only for the browser strategy.
    #[serde(default)]
    pub webdriver_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// How long one fetch outcome stays valid, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxConfig {
    /// Default tax rate on T-Bill returns, percent.
    #[serde(default = "default_tax_rate")]
    pub rate_percent: f64,
}

fn default_strategy() -> String {
    "http".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_wait_secs() -> u64 {
    30
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_database_path() -> String {
    "khazna.db".to_string()
}
fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    8080
}
fn default_tax_rate() -> f64 {
    20.0
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_port(),
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            rate_percent: default_tax_rate(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}
