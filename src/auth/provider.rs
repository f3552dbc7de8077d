//! auth::provider
//!
//! Default credential provider: environment variables, then the secrets file.
//!
//! # Resolution order
//!
//! For `github.com`:
//! 1. `GH_TOKEN`
//! 2. `GITHUB_TOKEN`
//!
//! For any other host (GitHub Enterprise):
//! 1. `GH_ENTERPRISE_TOKEN`
//! 2. `GITHUB_ENTERPRISE_TOKEN`
//!
//! Then, for every host, the token stored under that host in the
//! [`SecretStore`].

use tracing::debug;

use super::errors::AuthError;
use super::CredentialProvider;
use crate::core::config::DEFAULT_HOST;
use crate::secrets::SecretStore;

/// Environment lookup used for credential resolution.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variables consulted for github.com.
pub const PUBLIC_TOKEN_VARS: &[&str] = &["GH_TOKEN", "GITHUB_TOKEN"];

/// Environment variables consulted for enterprise hosts.
pub const ENTERPRISE_TOKEN_VARS: &[&str] = &["GH_ENTERPRISE_TOKEN", "GITHUB_ENTERPRISE_TOKEN"];

/// Resolves tokens from the environment and an optional secret store.
pub struct DefaultCredentials {
    env: EnvLookup,
    store: Option<Box<dyn SecretStore>>,
}

// Custom Debug so the store and env closure never show up in logs
impl std::fmt::Debug for DefaultCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCredentials")
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl DefaultCredentials {
    /// Read from the process environment and the given store.
    pub fn new(store: Option<Box<dyn SecretStore>>) -> Self {
        Self::with_env(Box::new(|name| std::env::var(name).ok()), store)
    }

    /// Use a custom environment lookup.
    pub fn with_env(env: EnvLookup, store: Option<Box<dyn SecretStore>>) -> Self {
        Self { env, store }
    }

    fn env_vars_for(host: &str) -> &'static [&'static str] {
        if host.eq_ignore_ascii_case(DEFAULT_HOST) {
            PUBLIC_TOKEN_VARS
        } else {
            ENTERPRISE_TOKEN_VARS
        }
    }
}

impl CredentialProvider for DefaultCredentials {
    fn token_for_host(&self, host: &str) -> Result<Option<String>, AuthError> {
        for var in Self::env_vars_for(host) {
            if let Some(token) = (self.env)(var).filter(|t| !t.trim().is_empty()) {
                debug!(host, source = *var, "using token from environment");
                return validated(host, var, token).map(Some);
            }
        }

        if let Some(store) = &self.store {
            if let Some(token) = store.token(host)? {
                debug!(host, "using token from secrets file");
                return validated(host, "secrets file", token).map(Some);
            }
        }

        debug!(host, "no token found, requests will be unauthenticated");
        Ok(None)
    }
}

fn validated(host: &str, source_name: &str, token: String) -> Result<String, AuthError> {
    let token = token.trim().to_string();
    if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(AuthError::MalformedToken {
            host: host.to_string(),
            source_name: source_name.to_string(),
        });
    }
    Ok(token)
}
