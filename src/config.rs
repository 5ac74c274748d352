use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub probe: ProbeConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub retry: RetryConfig,
}

/// Reachability probe target and cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
  #[serde(default = "default_probe_url")]
  pub url: String,
  #[serde(default = "default_probe_interval_secs")]
  pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Time-to-live for cached responses, in seconds.
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  #[serde(default = "default_delay_ms")]
  pub delay_ms: u64,
}

fn default_probe_url() -> String {
  "https://www.google.com".to_string()
}

fn default_probe_interval_secs() -> u64 {
  30
}

fn default_ttl_secs() -> u64 {
  3600
}

fn default_max_attempts() -> u32 {
  3
}

fn default_delay_ms() -> u64 {
  1000
}

impl Default for ProbeConfig {
  fn default() -> Self {
    Self {
      url: default_probe_url(),
      interval_secs: default_probe_interval_secs(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
    }
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      delay_ms: default_delay_ms(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fetchkit.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fetchkit/config.yaml
  ///
  /// Unlike most tools, a missing config file is not an error: every
  /// setting has a default, so the defaults are returned instead.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fetchkit.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fetchkit").join("config.yaml");
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

  /// Get the API bearer token from environment variables, if set.
  ///
  /// Checks FETCHKIT_API_TOKEN first, then API_TOKEN as fallback. Tokens
  /// never live in the config file.
  pub fn api_token() -> Option<String> {
    std::env::var("FETCHKIT_API_TOKEN")
      .or_else(|_| std::env::var("API_TOKEN"))
      .ok()
  }

  pub fn probe_interval(&self) -> Duration {
    Duration::from_secs(self.probe.interval_secs)
  }

  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache.ttl_secs)
  }

  pub fn retry_options(&self) -> crate::http::RetryOptions {
    crate::http::RetryOptions {
      max_attempts: self.retry.max_attempts,
      delay: Duration::from_millis(self.retry.delay_ms),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.probe.interval_secs, 30);
    assert_eq!(config.cache.ttl_secs, 3600);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.delay_ms, 1000);
  }

  #[test]
  fn partial_yaml_fills_in_defaults() {
    let config: Config = serde_yaml::from_str(
      r#"
probe:
  url: https://status.example.com
retry:
  max_attempts: 5
"#,
    )
    .unwrap();

    assert_eq!(config.probe.url, "https://status.example.com");
    assert_eq!(config.probe.interval_secs, 30);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.delay_ms, 1000);
    assert_eq!(config.cache.ttl_secs, 3600);
  }

  #[test]
  fn explicit_missing_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/does/not/exist.yaml"))).is_err());
  }

  #[test]
  fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "cache:\n  ttl_secs: 60\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.cache_ttl(), Duration::from_secs(60));
  }
}
