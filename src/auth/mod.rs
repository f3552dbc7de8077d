//! auth - credential resolution for the hosting API
//!
//! Tokens are never acquired interactively. A [`CredentialProvider`] looks
//! for an existing token for the target host; when none exists the tool
//! proceeds unauthenticated and the hosting API's own error is surfaced.
//!
//! # Security
//!
//! Tokens MUST never appear in logs, error messages, or debug output.

mod errors;
mod provider;

pub use errors::AuthError;
pub use provider::{DefaultCredentials, EnvLookup, ENTERPRISE_TOKEN_VARS, PUBLIC_TOKEN_VARS};

/// Supplies an access token for a hosting service.
pub trait CredentialProvider: Send + Sync {
    /// Returns the token for `host`, or `None` if no token is configured.
    ///
    /// # Errors
    ///
    /// Returns an error only when a token source exists but cannot be read
    /// or holds an unusable value.
    fn token_for_host(&self, host: &str) -> Result<Option<String>, AuthError>;
}
