use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub crm: CrmConfig,
  /// Minutes between scheduled cache refreshes
  #[serde(default = "default_refresh_interval")]
  pub refresh_interval_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
  /// Base URL of the CRM API, e.g. "https://api.hubapi.com/"
  pub url: String,
}

fn default_refresh_interval() -> u64 {
  5
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./crmcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/crmcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/crmcache/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("crmcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("crmcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the CRM API token from environment variables.
  ///
  /// Checks CRMCACHE_API_TOKEN first, then HUBSPOT_API_KEY as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("CRMCACHE_API_TOKEN")
      .or_else(|_| std::env::var("HUBSPOT_API_KEY"))
      .map_err(|_| {
        eyre!(
          "CRM API token not found. Set CRMCACHE_API_TOKEN or HUBSPOT_API_KEY environment variable."
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("crm:\n  url: https://api.hubapi.com/\n").unwrap();
    assert_eq!(config.crm.url, "https://api.hubapi.com/");
    assert_eq!(config.refresh_interval_minutes, 5);
  }

  #[test]
  fn test_parse_custom_interval() {
    let config: Config =
      serde_yaml::from_str("crm:\n  url: https://crm.example.com/\nrefresh_interval_minutes: 1\n")
        .unwrap();
    assert_eq!(config.refresh_interval_minutes, 1);
  }
}
