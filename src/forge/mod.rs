//! forge
//!
//! Abstraction over the repository hosting service.
//!
//! # Architecture
//!
//! The `Forge` trait defines every hosting-API call the bootstrap pipeline
//! makes. The pipeline receives a `&dyn Forge` and never names a concrete
//! implementation; the CLI builds one with [`create_forge`].
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub and GitHub Enterprise implementation over REST
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Forge creation and API base selection
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::forge::{create_forge, Forge};
//!
//! let forge = create_forge("github.com", token, None);
//! let me = forge.authenticated_user().await?;
//! tracing::info!(login = %me.login, "authenticated");
//! ```

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{api_base_for_host, create_forge};
pub use traits::*;
