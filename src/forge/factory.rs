//! forge::factory
//!
//! Forge creation.
//!
//! # Design
//!
//! Callers use [`create_forge`] instead of constructing `GitHubForge`
//! directly, so the host-to-API-endpoint rules live in one place.
//!
//! # API base selection
//!
//! - An explicit API URL always wins
//! - `github.com` → `https://api.github.com`
//! - any other host (GitHub Enterprise) → `https://{host}/api/v3`
//!
//! # Example
//!
//! ```
//! use gh_bootstrap::forge::api_base_for_host;
//!
//! assert_eq!(api_base_for_host("github.com"), "https://api.github.com");
//! assert_eq!(
//!     api_base_for_host("github.example.com"),
//!     "https://github.example.com/api/v3"
//! );
//! ```

use super::github::{GitHubForge, DEFAULT_API_BASE};
use super::traits::Forge;
use crate::core::config::DEFAULT_HOST;

/// REST API base URL for a hosting service hostname.
pub fn api_base_for_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.eq_ignore_ascii_case(DEFAULT_HOST) {
        DEFAULT_API_BASE.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

/// Create a forge for `host`.
///
/// # Arguments
///
/// * `host` - Hosting service hostname (e.g., `github.com`)
/// * `token` - Access token, or `None` for anonymous requests
/// * `api_url` - Explicit API base URL overriding the host-derived one
pub fn create_forge(host: &str, token: Option<String>, api_url: Option<&str>) -> Box<dyn Forge> {
    let api_base = match api_url {
        Some(url) => url.to_string(),
        None => api_base_for_host(host),
    };
    Box::new(GitHubForge::with_api_base(token, api_base))
}
