//! secrets
//!
//! Token storage for hosting service credentials.
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - The file store is read-only; it is maintained by hand
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::secrets::{FileSecretStore, SecretStore};
//!
//! let store = FileSecretStore::new("/home/me/.gh-bootstrap/secrets.toml");
//! if let Some(token) = store.token("github.com")? {
//!     // Use token (never print it!)
//! }
//! ```

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};
