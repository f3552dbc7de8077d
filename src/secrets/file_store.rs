//! secrets::file_store
//!
//! File-based token storage.
//!
//! Tokens live in a hand-maintained TOML file (default
//! `~/.gh-bootstrap/secrets.toml`):
//!
//! ```toml
//! [hosts."github.com"]
//! token = "ghp_..."
//!
//! [hosts."github.example.com"]
//! token = "ghp_..."
//! ```
//!
//! Host keys match ignoring ASCII case.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::traits::{SecretError, SecretStore};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretsFile {
    #[serde(default)]
    hosts: BTreeMap<String, HostSecrets>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HostSecrets {
    token: String,
}

/// Read-only token store backed by a TOML file.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a store reading `path`.
    ///
    /// A missing file holds no tokens.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the secrets file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SecretsFile, SecretError> {
        if !self.path.exists() {
            return Ok(SecretsFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        // toml errors quote the offending line, which may hold a token
        toml::from_str(&content).map_err(|_| {
            SecretError::ReadError(format!(
                "cannot parse secrets file '{}'",
                self.path.display()
            ))
        })
    }
}

impl SecretStore for FileSecretStore {
    fn token(&self, host: &str) -> Result<Option<String>, SecretError> {
        let secrets = self.read()?;
        Ok(secrets
            .hosts
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(host))
            .map(|(_, h)| h.token)
            .filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(content: &str) -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::new(temp.path().join("secrets.toml"));
        fs::write(store.path(), content).expect("write secrets");
        (temp, store)
    }

    #[test]
    fn missing_file_has_no_tokens() {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::new(temp.path().join("nested").join("secrets.toml"));
        assert!(store.token("github.com").expect("token").is_none());
    }

    #[test]
    fn tokens_are_per_host() {
        let (_temp, store) = store_with(
            "[hosts.\"github.com\"]\ntoken = \"public\"\n\n\
             [hosts.\"github.example.com\"]\ntoken = \"enterprise\"\n",
        );

        assert_eq!(
            store.token("github.com").unwrap(),
            Some("public".to_string())
        );
        assert_eq!(
            store.token("github.example.com").unwrap(),
            Some("enterprise".to_string())
        );
        assert!(store.token("gitlab.com").unwrap().is_none());
    }

    #[test]
    fn host_key_ignores_case() {
        let (_temp, store) = store_with("[hosts.\"GitHub.Example.COM\"]\ntoken = \"ghe\"\n");

        assert_eq!(
            store.token("github.example.com").unwrap(),
            Some("ghe".to_string())
        );
        assert_eq!(
            store.token("GITHUB.EXAMPLE.COM").unwrap(),
            Some("ghe".to_string())
        );
    }

    #[test]
    fn empty_token_is_absent() {
        let (_temp, store) = store_with("[hosts.\"github.com\"]\ntoken = \"\"\n");

        assert!(store.token("github.com").unwrap().is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        let (_temp, store) = store_with("[hosts.\"github.com\"]\ntoken = \"x\"\nuser = \"me\"\n");

        assert!(store.token("github.com").is_err());
    }

    #[test]
    fn parse_error_does_not_leak_token() {
        let (_temp, store) = store_with("[hosts.\"github.com\"]\ntoken = \"ghp_secret");

        let err = store.token("github.com").unwrap_err().to_string();
        assert!(err.contains("cannot parse"));
        assert!(!err.contains("ghp_secret"));
    }
}
