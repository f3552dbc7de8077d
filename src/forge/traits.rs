//! forge::traits
//!
//! Forge trait definition and the provider-neutral types it exchanges.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! It exposes exactly the reads and writes repository bootstrapping needs:
//! repository metadata, branches and their protection, teams, topics, and
//! repository creation.
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::core::types::RepositoryRef;
//! use gh_bootstrap::forge::{Forge, ForgeError};
//!
//! async fn default_branch(forge: &dyn Forge) -> Result<String, ForgeError> {
//!     let origin = RepositoryRef::parse("acme/template").unwrap();
//!     let repo = forge.get_repository(&origin).await?;
//!     Ok(repo.default_branch)
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::Transport;
use crate::core::types::RepositoryRef;

/// Errors from forge operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication failed (missing, invalid, or expired token).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The token lacks permission for the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource already exists or conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A successful response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// An account as returned by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub id: u64,
}

/// An organization as returned by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub login: String,
    pub id: u64,
}

/// Descriptive and feature metadata copied verbatim from origin to target.
///
/// Every field is optional; `None` leaves the forge default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySettings {
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub private: Option<bool>,
    pub has_issues: Option<bool>,
    pub has_wiki: Option<bool>,
    pub has_pages: Option<bool>,
    pub has_downloads: Option<bool>,
    pub allow_merge_commit: Option<bool>,
    pub allow_squash_merge: Option<bool>,
    pub allow_rebase_merge: Option<bool>,
}

/// A hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Owner login (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Default branch name
    pub default_branch: String,
    /// SSH transport address
    pub ssh_url: String,
    /// HTTPS transport address
    pub clone_url: String,
    /// Web URL for humans
    pub html_url: String,
    /// Copied metadata
    pub settings: RepositorySettings,
}

impl Repository {
    /// Transport address for the given transport.
    pub fn transport_url(&self, transport: Transport) -> &str {
        match transport {
            Transport::Ssh => &self.ssh_url,
            Transport::Https => &self.clone_url,
        }
    }
}

/// A branch listed on a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Whether the forge reports the branch as protected
    pub protected: bool,
}

/// A team with access to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub slug: String,
    pub name: String,
    /// Permission level on the repository (pull, triage, push, maintain,
    /// admin, or a custom role name)
    pub permission: String,
}

/// A user named in a restriction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub login: String,
    pub id: u64,
}

/// A team named in a restriction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// Users and teams allowed to perform a restricted action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    pub users: Vec<UserRef>,
    pub teams: Vec<TeamRef>,
}

impl Restrictions {
    /// True when neither users nor teams are listed.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty()
    }
}

/// Required status checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChecks {
    /// Require branches to be up to date before merging
    pub strict: bool,
    /// Check contexts that must pass
    pub contexts: Vec<String>,
}

/// Required pull request review policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPolicy {
    pub required_approving_review_count: u32,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    /// Who may dismiss reviews, if restricted
    pub dismissal_restrictions: Option<Restrictions>,
}

/// Protection settings of a single branch, as read from the forge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchProtection {
    pub required_status_checks: Option<StatusChecks>,
    pub required_pull_request_reviews: Option<ReviewPolicy>,
    pub enforce_admins: bool,
    /// Who may push, if restricted
    pub restrictions: Option<Restrictions>,
    pub required_linear_history: Option<bool>,
    pub allow_force_pushes: Option<bool>,
    pub allow_deletions: Option<bool>,
    pub required_conversation_resolution: Option<bool>,
}

/// Request to create a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub settings: RepositorySettings,
}

/// User/team restriction lists by string identifier (logins and team slugs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionsRequest {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

/// Review policy to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPolicyRequest {
    pub required_approving_review_count: u32,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub dismissal_restrictions: Option<RestrictionsRequest>,
}

/// Branch protection to apply to a branch.
///
/// `None` for `restrictions` or `required_pull_request_reviews` disables
/// that rule rather than sending an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionRequest {
    pub required_status_checks: Option<StatusChecks>,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: Option<ReviewPolicyRequest>,
    pub restrictions: Option<RestrictionsRequest>,
    pub required_linear_history: Option<bool>,
    pub allow_force_pushes: Option<bool>,
    pub allow_deletions: Option<bool>,
    pub required_conversation_resolution: Option<bool>,
}

/// The Forge trait for interacting with remote hosting services.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Nothing is retried; callers
/// decide whether an error is fatal.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// The account the token belongs to.
    async fn authenticated_user(&self) -> Result<User, ForgeError>;

    /// Look up an organization by login.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such organization exists (including when the login
    ///   belongs to a user)
    async fn get_organization(&self, org: &str) -> Result<Organization, ForgeError>;

    /// Get repository metadata.
    async fn get_repository(&self, repo: &RepositoryRef) -> Result<Repository, ForgeError>;

    /// List every branch of a repository, following pagination.
    async fn list_branches(&self, repo: &RepositoryRef) -> Result<Vec<Branch>, ForgeError>;

    /// Get the protection of a branch.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the branch is not protected.
    async fn get_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<BranchProtection>, ForgeError>;

    /// List teams with access to a repository, following pagination.
    async fn list_teams(&self, repo: &RepositoryRef) -> Result<Vec<Team>, ForgeError>;

    /// List repository topics.
    async fn list_topics(&self, repo: &RepositoryRef) -> Result<Vec<String>, ForgeError>;

    /// Create a repository.
    ///
    /// `org` of `None` creates it under the authenticated user.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the name is already taken
    /// - `PermissionDenied` if the token may not create repositories there
    async fn create_repository(
        &self,
        org: Option<&str>,
        request: CreateRepositoryRequest,
    ) -> Result<Repository, ForgeError>;

    /// Grant an organization team a permission level on a repository.
    async fn add_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &RepositoryRef,
        permission: &str,
    ) -> Result<(), ForgeError>;

    /// Replace the full topic set of a repository.
    ///
    /// # Returns
    ///
    /// The topic set as stored by the forge.
    async fn replace_topics(
        &self,
        repo: &RepositoryRef,
        topics: &[String],
    ) -> Result<Vec<String>, ForgeError>;

    /// Create or replace the protection of a branch.
    async fn update_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        request: ProtectionRequest,
    ) -> Result<(), ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_repo() -> Repository {
        Repository {
            owner: "acme".into(),
            name: "template".into(),
            full_name: "acme/template".into(),
            default_branch: "main".into(),
            ssh_url: "git@github.com:acme/template.git".into(),
            clone_url: "https://github.com/acme/template.git".into(),
            html_url: "https://github.com/acme/template".into(),
            settings: RepositorySettings::default(),
        }
    }

    #[test]
    fn transport_url_selects_address() {
        let repo = sample_repo();
        assert_eq!(
            repo.transport_url(Transport::Ssh),
            "git@github.com:acme/template.git"
        );
        assert_eq!(
            repo.transport_url(Transport::Https),
            "https://github.com/acme/template.git"
        );
    }

    #[test]
    fn restrictions_is_empty() {
        assert!(Restrictions::default().is_empty());

        let with_user = Restrictions {
            users: vec![UserRef {
                login: "alice".into(),
                id: 1,
            }],
            teams: vec![],
        };
        assert!(!with_user.is_empty());
    }

    #[test]
    fn forge_error_display() {
        assert_eq!(
            ForgeError::AuthFailed("bad credentials".into()).to_string(),
            "authentication failed: bad credentials"
        );
        assert_eq!(
            ForgeError::Conflict("name already exists on this account".into()).to_string(),
            "conflict: name already exists on this account"
        );
        assert_eq!(ForgeError::RateLimited.to_string(), "rate limited");
        assert_eq!(
            ForgeError::ApiError {
                status: 500,
                message: "boom".into()
            }
            .to_string(),
            "API error: 500 - boom"
        );
    }
}
