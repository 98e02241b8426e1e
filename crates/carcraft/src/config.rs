//! Configuration for the carcraft CLI
//!
//! Settings live in `<home>/config.json`; a missing file means defaults.
//! The home directory is `$CARCRAFT_HOME` when set, else `~/.carcraft`.

use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "CARCRAFT_HOME";
pub const API_URL_ENV: &str = "CARCRAFT_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Base URL of the prediction API
  #[serde(default = "default_api_base_url")]
  pub api_base_url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Where prediction data is kept; defaults to `<home>/storage`
  #[serde(default)]
  pub storage_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
  "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

impl Default for Config {
  fn default() -> Self {
    Self { api_base_url: default_api_base_url(), timeout_secs: default_timeout_secs(), storage_dir: None }
  }
}

impl Config {
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
      .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
  }

  /// Load `<home>/config.json` if present, then apply environment overrides
  pub fn load() -> Result<Self> {
    let path = get_home()?.join("config.json");
    let mut config = if path.exists() { Self::load_from_file(&path)? } else { Self::default() };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      if !url.trim().is_empty() {
        config.api_base_url = url;
      }
    }
    Ok(config)
  }

  pub fn storage_dir(&self) -> Result<PathBuf> {
    match &self.storage_dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(get_home()?.join("storage")),
    }
  }
}

/// Root directory for carcraft data
pub fn get_home() -> Result<PathBuf> {
  if let Ok(custom) = std::env::var(HOME_ENV) {
    return Ok(PathBuf::from(custom));
  }

  let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
  Ok(home.join(".carcraft"))
}
