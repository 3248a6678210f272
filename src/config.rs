//! Application configuration.
//!
//! Values are resolved per field with priority config.toml > environment
//! (`.env` included) > defaults. The config file path can be overridden
//! with `FLUENT_FUSION_CONFIG`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ==================== Defaults ====================

pub const CONFIG_PATH_ENV: &str = "FLUENT_FUSION_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "data/fluent_fusion.db";

/// Bearer token lifetime
pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Idle lesson sessions are dropped after this long
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 1;

/// Upper bound for either expiry setting (one year)
pub const MAX_EXPIRY_HOURS: i64 = 24 * 365;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

// ==================== File layout ====================

/// config.toml structure; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
  pub server: Option<ServerSection>,
  pub database: Option<DatabaseSection>,
  pub auth: Option<AuthSection>,
  pub sessions: Option<SessionsSection>,
  pub cors: Option<CorsSection>,
  pub catalog: Option<CatalogSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
  pub host: Option<String>,
  pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
  pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthSection {
  pub token_expiry_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionsSection {
  pub expiry_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorsSection {
  pub origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSection {
  pub path: Option<String>,
}

// ==================== Resolved config ====================

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub host: String,
  pub port: u16,
  pub database_path: PathBuf,
  pub token_expiry_hours: i64,
  pub session_expiry_hours: i64,
  pub cors_origins: Vec<String>,
  /// Lesson catalog override; the bundled catalog is used when unset
  pub catalog_path: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      host: DEFAULT_HOST.to_string(),
      port: DEFAULT_PORT,
      database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
      token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
      session_expiry_hours: DEFAULT_SESSION_EXPIRY_HOURS,
      cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
      catalog_path: None,
    }
  }
}

impl AppConfig {
  /// Load `.env`, read the config file if present, and resolve every field
  pub fn load() -> Self {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let file = read_file_config(Path::new(&path));
    let config = Self::resolve(file, |key| std::env::var(key).ok());

    tracing::info!("Using database path: {}", config.database_path.display());
    config
  }

  /// Merge file values, then `env` lookups, then defaults
  pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
    let defaults = Self::default();
    let env_parsed = |key: &str| -> Option<i64> {
      let raw = env(key)?;
      match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
          tracing::warn!("Ignoring {}={:?}: not a number", key, raw);
          None
        }
      }
    };

    let server = file.server.unwrap_or_default();
    let database = file.database.unwrap_or_default();
    let auth = file.auth.unwrap_or_default();
    let sessions = file.sessions.unwrap_or_default();
    let cors = file.cors.unwrap_or_default();
    let catalog = file.catalog.unwrap_or_default();

    Self {
      host: server.host.or_else(|| env("HOST")).unwrap_or(defaults.host),
      port: server
        .port
        .or_else(|| env_parsed("PORT").and_then(|p| u16::try_from(p).ok()))
        .unwrap_or(defaults.port),
      database_path: database
        .path
        .or_else(|| env("DATABASE_PATH"))
        .map(PathBuf::from)
        .unwrap_or(defaults.database_path),
      token_expiry_hours: clamp_expiry_hours(
        "token_expiry_hours",
        auth
          .token_expiry_hours
          .or_else(|| env_parsed("TOKEN_EXPIRY_HOURS"))
          .unwrap_or(defaults.token_expiry_hours),
      ),
      session_expiry_hours: clamp_expiry_hours(
        "session_expiry_hours",
        sessions
          .expiry_hours
          .or_else(|| env_parsed("SESSION_EXPIRY_HOURS"))
          .unwrap_or(defaults.session_expiry_hours),
      ),
      cors_origins: cors
        .origins
        .or_else(|| env("CORS_ORIGINS").map(|raw| split_origins(&raw)))
        .unwrap_or(defaults.cors_origins),
      catalog_path: catalog.path.or_else(|| env("CATALOG_PATH")).map(PathBuf::from),
    }
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

fn read_file_config(path: &Path) -> FileConfig {
  let contents = match std::fs::read_to_string(path) {
    Ok(contents) => contents,
    Err(_) => return FileConfig::default(),
  };
  match toml::from_str(&contents) {
    Ok(config) => {
      tracing::info!("Loaded configuration from {}", path.display());
      config
    }
    Err(e) => {
      tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
      FileConfig::default()
    }
  }
}

/// Keep an expiry within 1..=MAX_EXPIRY_HOURS
fn clamp_expiry_hours(name: &str, hours: i64) -> i64 {
  let clamped = hours.clamp(1, MAX_EXPIRY_HOURS);
  if clamped != hours {
    tracing::warn!("{} = {} is out of range, using {}", name, hours, clamped);
  }
  clamped
}

/// Comma-separated origin list, blanks dropped
fn split_origins(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = AppConfig::resolve(FileConfig::default(), env_from(&[]));
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.token_expiry_hours, 24);
    assert_eq!(config.session_expiry_hours, 1);
    assert_eq!(config.cors_origins, vec!["http://localhost:5173", "http://localhost:3000"]);
  }

  #[test]
  fn test_env_overrides_defaults() {
    let env = env_from(&[
      ("DATABASE_PATH", "/tmp/ff.db"),
      ("PORT", "9100"),
      ("CORS_ORIGINS", "https://a.rw, ,https://b.rw"),
      ("TOKEN_EXPIRY_HOURS", "48"),
      ("CATALOG_PATH", "lessons.json"),
    ]);
    let config = AppConfig::resolve(FileConfig::default(), env);
    assert_eq!(config.database_path, PathBuf::from("/tmp/ff.db"));
    assert_eq!(config.port, 9100);
    assert_eq!(config.cors_origins, vec!["https://a.rw", "https://b.rw"]);
    assert_eq!(config.token_expiry_hours, 48);
    assert_eq!(config.catalog_path, Some(PathBuf::from("lessons.json")));
  }

  #[test]
  fn test_file_overrides_env() {
    let file: FileConfig = toml::from_str(
      r#"
      [database]
      path = "from-file.db"

      [server]
      port = 7000

      [sessions]
      expiry_hours = 3
      "#,
    )
    .unwrap();
    let env = env_from(&[("DATABASE_PATH", "from-env.db"), ("PORT", "9100"), ("HOST", "127.0.0.1")]);
    let config = AppConfig::resolve(file, env);
    assert_eq!(config.database_path, PathBuf::from("from-file.db"));
    assert_eq!(config.port, 7000);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.session_expiry_hours, 3);
    assert_eq!(config.bind_addr(), "127.0.0.1:7000");
  }

  #[test]
  fn test_bad_numbers_fall_back() {
    let config = AppConfig::resolve(FileConfig::default(), env_from(&[("PORT", "eighty"), ("TOKEN_EXPIRY_HOURS", "")]));
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.token_expiry_hours, DEFAULT_TOKEN_EXPIRY_HOURS);
  }

  #[test]
  fn test_session_expiry_from_env() {
    let config = AppConfig::resolve(FileConfig::default(), env_from(&[("SESSION_EXPIRY_HOURS", "6")]));
    assert_eq!(config.session_expiry_hours, 6);
  }

  #[test]
  fn test_expiry_hours_clamped() {
    let file: FileConfig = toml::from_str(
      r#"
      [auth]
      token_expiry_hours = 0

      [sessions]
      expiry_hours = 9223372036854775807
      "#,
    )
    .unwrap();
    let config = AppConfig::resolve(file, env_from(&[]));
    assert_eq!(config.token_expiry_hours, 1);
    assert_eq!(config.session_expiry_hours, MAX_EXPIRY_HOURS);

    let config = AppConfig::resolve(FileConfig::default(), env_from(&[("TOKEN_EXPIRY_HOURS", "-5")]));
    assert_eq!(config.token_expiry_hours, 1);
  }

  #[test]
  fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = read_file_config(&dir.path().join("absent.toml"));
    assert!(file.database.is_none());
  }
}
