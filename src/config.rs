use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Error, Result};

/// Base URL used when neither the config file nor the environment sets one.
const DEFAULT_BASE_URL: &str = "http://localhost:8001";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Backend base URL.
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Path prefix in front of every endpoint (e.g. "/api"). Some deployments
  /// mount the API at the root, some under a prefix; both expose the same
  /// endpoint shapes.
  #[serde(default)]
  pub api_prefix: Option<String>,
  /// How `login` validates credentials.
  #[serde(default)]
  pub auth: AuthMode,
  /// Accounts for [`AuthMode::Local`]. Ignored in backend mode.
  #[serde(default)]
  pub local_accounts: Vec<LocalAccount>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

/// Login strategy selection.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
  /// Credentials validated by the backend via POST /auth/login
  #[default]
  Backend,
  /// Credentials checked against `local_accounts`, no server round-trip.
  /// Weaker than backend validation; meant for kiosk-style deployments
  /// where the backend exposes no login endpoint.
  Local,
}

/// A locally validated account.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalAccount {
  pub username: String,
  /// Hex-encoded SHA-256 digest of the password.
  pub password_sha256: String,
  /// Opaque profile stored as the session user on successful login.
  #[serde(default)]
  pub user: serde_json::Value,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      api_prefix: None,
      auth: AuthMode::default(),
      local_accounts: Vec::new(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./kadra.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/kadra/config.yaml
  ///
  /// If no file is found, defaults are used. Either way the
  /// `KADRA_BASE_URL` environment variable overrides `base_url`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!("config file not found: {}", p.display())));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    Ok(config.apply_env_overrides())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("kadra.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("kadra").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("failed to read config file {}: {}", path.display(), e)))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| Error::Config(format!("failed to parse config file {}: {}", path.display(), e)))
  }

  fn apply_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("KADRA_BASE_URL") {
      if !url.is_empty() {
        self.base_url = url;
      }
    }
    self
  }

  /// The validated root every endpoint path is appended to: base URL plus
  /// the optional API prefix, without a trailing slash.
  pub fn root_url(&self) -> Result<String> {
    let base = Url::parse(&self.base_url)
      .map_err(|e| Error::Config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;

    let mut root = base.as_str().trim_end_matches('/').to_string();
    if let Some(prefix) = &self.api_prefix {
      let prefix = prefix.trim_matches('/');
      if !prefix.is_empty() {
        root.push('/');
        root.push_str(prefix);
      }
    }

    Ok(root)
  }
}
