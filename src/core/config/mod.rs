//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (applied by the CLI layer onto [`Config::global`])
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$GH_BOOTSTRAP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gh-bootstrap/config.toml`
//! 3. `~/.gh-bootstrap/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gh_bootstrap::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Host: {}", config.host());
//! println!("Transport: {}", config.transport());
//! ```

pub mod schema;

pub use schema::{AuthorConfig, GlobalConfig, Transport};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GH_BOOTSTRAP_CONFIG";

/// Default hosting service.
pub const DEFAULT_HOST: &str = "github.com";

/// Default clone depth for the origin repository.
pub const DEFAULT_CLONE_DEPTH: u32 = 1;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration.
///
/// Accessors apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file (and CLI overrides)
    pub global: GlobalConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;

        Ok(Config {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gh-bootstrap/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".gh-bootstrap/config.toml");
        path.exists().then_some(path)
    }

    /// Default location of the secrets file: `~/.gh-bootstrap/secrets.toml`.
    pub fn default_secrets_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gh-bootstrap/secrets.toml"))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Hosting service hostname. Defaults to `github.com`.
    pub fn host(&self) -> &str {
        self.global.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Explicit API base URL, if configured.
    pub fn api_url(&self) -> Option<&str> {
        self.global.api_url.as_deref()
    }

    /// Transport for clone and push. Defaults to SSH.
    pub fn transport(&self) -> Transport {
        self.global
            .transport
            .as_deref()
            .and_then(Transport::parse)
            .unwrap_or_default()
    }

    /// Clone depth for the origin, `None` meaning full history.
    ///
    /// Defaults to a depth of 1; a configured depth of 0 disables shallow
    /// cloning.
    pub fn clone_depth(&self) -> Option<u32> {
        match self.global.clone_depth {
            Some(0) => None,
            Some(depth) => Some(depth),
            None => Some(DEFAULT_CLONE_DEPTH),
        }
    }

    /// Root for temporary working trees. Defaults to the system temp dir.
    pub fn temp_dir(&self) -> PathBuf {
        self.global
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Whether non-404 protection lookup errors abort the run.
    ///
    /// Defaults to `false`.
    pub fn strict_protection_lookup(&self) -> bool {
        self.global.strict_protection_lookup.unwrap_or(false)
    }

    /// Path to the secrets file.
    pub fn secrets_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.global.secrets_file {
            Some(path) => Ok(path.clone()),
            None => Self::default_secrets_path(),
        }
    }

    /// Fallback commit author name.
    pub fn author_name(&self) -> &str {
        self.global
            .author
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or("gh-bootstrap")
    }

    /// Fallback commit author email.
    pub fn author_email(&self) -> &str {
        self.global
            .author
            .as_ref()
            .and_then(|a| a.email.as_deref())
            .unwrap_or("gh-bootstrap@users.noreply.github.com")
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
