//! Service configuration for the triage desk
//!
//! Settings are loaded from (later sources override earlier ones):
//! 1. Built-in defaults
//! 2. JSON file (~/.config/triage-desk/settings.json)
//! 3. Environment variables (`TRIAGE_STORAGE_URL`, `TRIAGE_STORAGE_KEY`,
//!    `TRIAGE_WEBHOOK_URL`)

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings filename in the config directory
pub const SETTINGS_FILE: &str = "settings.json";

pub const ENV_STORAGE_URL: &str = "TRIAGE_STORAGE_URL";
pub const ENV_STORAGE_KEY: &str = "TRIAGE_STORAGE_KEY";
pub const ENV_WEBHOOK_URL: &str = "TRIAGE_WEBHOOK_URL";

/// Category labels fetched by default, in both spellings seen in storage
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "lead",
    "high priority",
    "high-priority",
    "customer support",
    "customer-support",
];

/// Default polling interval of the inbox feed
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Where the desk finds its storage service and send-workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Project URL of the row storage service
    pub storage_url: Option<String>,
    /// Public API key of the row storage service
    pub storage_key: Option<String>,
    /// Endpoint of the send-workflow
    pub webhook_url: Option<String>,
    /// Category labels the inbox feed fetches
    pub categories: Vec<String>,
    pub refresh_interval_secs: u64,
    /// Rows loaded into the offline store when no storage service is set
    pub seed_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_url: None,
            storage_key: None,
            webhook_url: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            seed_file: None,
        }
    }
}

/// Storage credentials, present only when both halves are set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub url: String,
    pub key: String,
}

impl ServiceConfig {
    /// Load settings from the config directory, then apply the environment
    pub fn load() -> Result<Self> {
        debug!("Loading {}", SETTINGS_FILE);
        let mut cfg: Self = config::load_json_or_default(SETTINGS_FILE)?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load settings from a specific JSON file, without the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write these settings to settings.json in the config directory
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self)
    }

    /// Write these settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json_file(path, self)
    }

    /// Write default settings unless settings.json already exists
    ///
    /// Returns `true` when a file was written.
    pub fn write_default_if_missing() -> Result<bool> {
        if config::config_exists(SETTINGS_FILE) {
            return Ok(false);
        }
        Self::default().save()?;
        Ok(true)
    }

    /// Override fields from variables returned by `lookup`; blank values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = read(ENV_STORAGE_URL) {
            self.storage_url = Some(url);
        }
        if let Some(key) = read(ENV_STORAGE_KEY) {
            self.storage_key = Some(key);
        }
        if let Some(url) = read(ENV_WEBHOOK_URL) {
            self.webhook_url = Some(url);
        }
    }

    /// Storage credentials, or `None` when the desk should run offline
    pub fn storage(&self) -> Option<StorageCredentials> {
        let url = non_blank(&self.storage_url)?;
        let key = non_blank(&self.storage_key)?;
        Some(StorageCredentials {
            url: url.to_string(),
            key: key.to_string(),
        })
    }

    /// Whether storage credentials are missing
    pub fn is_offline(&self) -> bool {
        let offline = self.storage().is_none();
        if offline && (self.storage_url.is_some() || self.storage_key.is_some()) {
            warn!("Storage URL and key must both be set");
        }
        offline
    }

    pub fn webhook(&self) -> Option<&str> {
        non_blank(&self.webhook_url)
    }

    /// Polling interval, never below one second
    pub fn refresh_interval_secs(&self) -> u64 {
        self.refresh_interval_secs.max(1)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
