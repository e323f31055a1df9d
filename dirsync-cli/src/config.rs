//! CLI configuration: `~/.dirsync/config.yaml` plus environment overrides.
//!
//! The API key is read from `DIRSYNC_API_KEY` only and is never written to
//! disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use dirsync_core::document::dirsync_root_at;
use dirsync_reconcile::HttpConfig;

pub const DEFAULT_BASE_URL: &str = "https://console.jumpcloud.com/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "DIRSYNC_BASE_URL";
pub const ENV_API_KEY: &str = "DIRSYNC_API_KEY";
pub const ENV_ORG_ID: &str = "DIRSYNC_ORG_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub org_id: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            org_id: None,
            api_key: None,
        }
    }
}

pub fn config_path_at(home: &Path) -> PathBuf {
    dirsync_root_at(home).join("config.yaml")
}

impl Config {
    /// File settings (defaults when the file is missing) with process
    /// environment overrides applied.
    pub fn load_at(home: &Path) -> Result<Self> {
        let mut config = Self::read_file(&config_path_at(home))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(org) = get(ENV_ORG_ID) {
            self.org_id = Some(org);
        }
        self.api_key = get(ENV_API_KEY);
    }

    /// Transport settings. Fails without an API key.
    pub fn http(&self) -> Result<HttpConfig> {
        let Some(api_key) = self.api_key.clone() else {
            bail!("{ENV_API_KEY} is not set; export it to talk to the directory API");
        };
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(HttpConfig {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            api_key,
            org_id: self.org_id.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}
