//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (first found wins):
//! 1. `$GH_BOOTSTRAP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gh-bootstrap/config.toml`
//! 3. `~/.gh-bootstrap/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing so a typo in `transport` fails
//! before any API call is made.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// User configuration.
///
/// # Example
///
/// ```toml
/// host = "github.example.com"
/// api_url = "https://github.example.com/api/v3"
/// transport = "ssh"
/// clone_depth = 1
/// strict_protection_lookup = false
///
/// [author]
/// name = "Platform Bot"
/// email = "platform-bot@example.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Hosting service hostname (e.g., "github.com")
    pub host: Option<String>,

    /// REST API base URL override
    pub api_url: Option<String>,

    /// Transport used for clone and push ("ssh" or "https")
    pub transport: Option<String>,

    /// Clone depth for the origin; 0 means full history
    pub clone_depth: Option<u32>,

    /// Directory under which temporary working trees are created
    pub temp_dir: Option<PathBuf>,

    /// Treat non-404 branch protection lookup errors as fatal
    pub strict_protection_lookup: Option<bool>,

    /// Path to the secrets file
    pub secrets_file: Option<PathBuf>,

    /// Fallback commit author when git config has none
    pub author: Option<AuthorConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid host '{}', expected a bare hostname",
                    host
                )));
            }
        }

        if let Some(url) = &self.api_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid api_url '{}', must start with http:// or https://",
                    url
                )));
            }
        }

        if let Some(transport) = &self.transport {
            if Transport::parse(transport).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid transport '{}', must be one of: {}",
                    transport,
                    Transport::VALID.join(", ")
                )));
            }
        }

        if let Some(author) = &self.author {
            author.validate()?;
        }

        Ok(())
    }
}

/// Commit author fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "author.name cannot be empty".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid author.email '{}'",
                    email
                )));
            }
        }
        Ok(())
    }
}

/// Transport used to reach repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// SSH URLs, authenticated through the SSH agent
    #[default]
    Ssh,
    /// HTTPS clone URLs, authenticated with the API token
    Https,
}

impl Transport {
    /// Valid transport names.
    pub const VALID: &'static [&'static str] = &["ssh", "https"];

    /// Parse a transport name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ssh" => Some(Transport::Ssh),
            "https" => Some(Transport::Https),
            _ => None,
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Ssh => write!(f, "ssh"),
            Transport::Https => write!(f, "https"),
        }
    }
}
