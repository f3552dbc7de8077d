//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! Secrets are API tokens keyed by hosting service hostname
//! (e.g., `github.com`, `github.example.com`).
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secrets: {0}")]
    ReadError(String),
}

/// Host-keyed token storage.
pub trait SecretStore: Send + Sync {
    /// Get the token stored for a host.
    ///
    /// Returns `Ok(None)` if no token is stored.
    ///
    /// # Security
    ///
    /// The returned value is the raw secret. Do not log or print it.
    fn token(&self, host: &str) -> Result<Option<String>, SecretError>;
}
