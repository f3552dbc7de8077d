//! auth::errors
//!
//! Credential resolution errors.
//!
//! Error messages MUST NOT contain tokens.

use thiserror::Error;

/// Errors from credential resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from secret storage.
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// A token was found but cannot be sent as an HTTP header value.
    #[error("token for host '{host}' from {source_name} contains invalid characters")]
    MalformedToken { host: String, source_name: String },
}

impl From<crate::secrets::SecretError> for AuthError {
    fn from(err: crate::secrets::SecretError) -> Self {
        AuthError::SecretStore(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretError;

    #[test]
    fn secret_error_converts() {
        let err: AuthError = SecretError::ReadError("disk".into()).into();
        assert_eq!(
            err.to_string(),
            "secret store error: failed to read secrets: disk"
        );
    }

    #[test]
    fn malformed_token_names_source_not_value() {
        let err = AuthError::MalformedToken {
            host: "github.com".into(),
            source_name: "GH_TOKEN".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("github.com"));
        assert!(msg.contains("GH_TOKEN"));
    }
}
