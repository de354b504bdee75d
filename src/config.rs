use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_MAX_AGE_MS;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Workspace export to read (JSON)
  pub snapshot: Option<PathBuf>,
  /// Project whose tasks open first
  pub default_project: Option<String>,
  /// Custom title for header (defaults to the snapshot file name)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Age in milliseconds after which cached lists are refetched
  #[serde(default = "default_max_age_ms")]
  pub default_max_age_ms: u64,
}

fn default_max_age_ms() -> u64 {
  DEFAULT_MAX_AGE_MS as u64
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      default_max_age_ms: default_max_age_ms(),
    }
  }
}

impl CacheConfig {
  pub fn default_max_age(&self) -> Duration {
    i64::try_from(self.default_max_age_ms)
      .ok()
      .and_then(Duration::try_milliseconds)
      .unwrap_or(Duration::MAX)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is not set (e.g. "info", "taskdeck=debug")
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Directory for log files (defaults to <data dir>/taskdeck/logs)
  pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./taskdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/taskdeck/config.yaml
  ///
  /// With no file found, defaults apply.
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
    let local = PathBuf::from("taskdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("taskdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self> {
    // An empty file parses as YAML null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Resolve the snapshot to read.
  ///
  /// Uses the configured path, then TASKDECK_SNAPSHOT.
  pub fn snapshot_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.snapshot {
      return Ok(path.clone());
    }
    std::env::var_os("TASKDECK_SNAPSHOT")
      .map(PathBuf::from)
      .ok_or_else(|| {
        eyre!(
          "No workspace snapshot configured. Set `snapshot` in the config file, \
           pass --data, or set TASKDECK_SNAPSHOT."
        )
      })
  }

  /// Directory for log files.
  pub fn log_directory(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.log.directory {
      return Ok(dir.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("taskdeck").join("logs"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml_str("").unwrap();
    assert!(config.snapshot.is_none());
    assert_eq!(config.cache.default_max_age_ms, 300_000);
    assert_eq!(config.cache.default_max_age(), Duration::minutes(5));
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_full_config() {
    let config = Config::from_yaml_str(
      r#"
snapshot: /tmp/workspace.json
default_project: p1
title: Acme
cache:
  default_max_age_ms: 1000
log:
  level: taskdeck=debug
  directory: /tmp/taskdeck-logs
"#,
    )
    .unwrap();

    assert_eq!(
      config.snapshot_path().unwrap(),
      PathBuf::from("/tmp/workspace.json")
    );
    assert_eq!(config.default_project.as_deref(), Some("p1"));
    assert_eq!(config.title.as_deref(), Some("Acme"));
    assert_eq!(config.cache.default_max_age(), Duration::seconds(1));
    assert_eq!(config.log.level, "taskdeck=debug");
    assert_eq!(
      config.log_directory().unwrap(),
      PathBuf::from("/tmp/taskdeck-logs")
    );
  }

  #[test]
  fn test_partial_cache_section_keeps_default() {
    let config = Config::from_yaml_str("cache: {}\n").unwrap();
    assert_eq!(config.cache.default_max_age_ms, 300_000);
  }

  #[test]
  fn test_invalid_yaml_is_error() {
    assert!(Config::from_yaml_str("cache: [not, a, map]").is_err());
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_project: p7").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.default_project.as_deref(), Some("p7"));
  }

  #[test]
  fn test_load_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/no/such/taskdeck.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
