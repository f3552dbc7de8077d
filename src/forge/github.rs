//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub and GitHub Enterprise.
//! Wire formats live in private `GitHub*` structs and are converted into the
//! provider-neutral types from [`super::traits`] at the edge.
//!
//! # Authentication
//!
//! A static token is optional. Without one, requests are sent anonymously
//! and GitHub's own 401/404 is surfaced to the caller.
//!
//! # Rate Limiting
//!
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Nothing is retried
//!
//! # Pagination
//!
//! List endpoints are requested with `per_page=100` and followed page by page
//! until a short page is returned.
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::forge::github::GitHubForge;
//! use gh_bootstrap::forge::Forge;
//!
//! let forge = GitHubForge::new(Some(token));
//! let me = forge.authenticated_user().await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    Branch, BranchProtection, CreateRepositoryRequest, Forge, ForgeError, Organization,
    ProtectionRequest, Repository, RepositorySettings, Restrictions, RestrictionsRequest,
    ReviewPolicy, StatusChecks, Team, TeamRef, User, UserRef,
};
use crate::core::types::RepositoryRef;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "gh-bootstrap";

/// Page size for list endpoints.
const PER_PAGE: u32 = 100;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Access token, if any
    token: Option<String>,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &self.token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge talking to `api.github.com`.
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g., `https://github.example.com/api/v3`).
    /// A trailing slash is ignored.
    pub fn with_api_base(token: Option<String>, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            token,
            api_base,
        }
    }

    /// The API base URL in use.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether requests carry an Authorization header.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, repo: &RepositoryRef, path: &str) -> String {
        let base = format!(
            "{}/repos/{}/{}",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        if path.is_empty() {
            base
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// URL of a branch's protection endpoint, with the branch name as one
    /// escaped path segment.
    fn protection_url(&self, repo: &RepositoryRef, branch: &str) -> Result<Url, ForgeError> {
        let mut url = Url::parse(&self.repo_url(repo, "branches"))
            .map_err(|e| ForgeError::NetworkError(format!("invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ForgeError::NetworkError("API URL cannot have a path".into()))?
            .pop_if_empty()
            .push(branch)
            .push("protection");
        Ok(url)
    }

    /// Send a request, mapping transport failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ForgeError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ForgeError::Decode(e.to_string()))
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle a response whose body is not needed.
    async fn handle_empty_response(&self, response: Response) -> Result<(), ForgeError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        let headers = response.headers();
        let rate_limit_exhausted = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");
        let accepted_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .or_else(|| headers.get("X-Accepted-OAuth-Scopes"))
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let body = response.json::<GitHubErrorResponse>().await.ok();
        let message = body
            .as_ref()
            .map(GitHubErrorResponse::describe)
            .unwrap_or_else(|| "Unknown error".to_string());

        debug!(status = status.as_u16(), %message, "GitHub API error");

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed(message),
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => match accepted_permissions {
                Some(required) => {
                    ForgeError::PermissionDenied(format!("{} [required: {}]", message, required))
                }
                None => ForgeError::PermissionDenied(message),
            },
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::CONFLICT => ForgeError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("already exists") => {
                ForgeError::Conflict(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// GET every page of a list endpoint.
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ForgeError> {
        let mut items = Vec::new();
        for page in 1u32.. {
            let request = self
                .client
                .get(url)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let response = self.send(request).await?;
            let batch: Vec<T> = self.handle_response(response).await?;
            let last = batch.len() < PER_PAGE as usize;
            items.extend(batch);
            if last {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn authenticated_user(&self) -> Result<User, ForgeError> {
        let url = format!("{}/user", self.api_base);
        let response = self.send(self.client.get(&url)).await?;
        let user: GitHubAccount = self.handle_response(response).await?;
        Ok(User {
            login: user.login,
            id: user.id,
        })
    }

    async fn get_organization(&self, org: &str) -> Result<Organization, ForgeError> {
        let url = format!("{}/orgs/{}", self.api_base, org);
        let response = self.send(self.client.get(&url)).await?;
        let org: GitHubAccount = self.handle_response(response).await?;
        Ok(Organization {
            login: org.login,
            id: org.id,
        })
    }

    async fn get_repository(&self, repo: &RepositoryRef) -> Result<Repository, ForgeError> {
        let url = self.repo_url(repo, "");
        let response = self.send(self.client.get(&url)).await?;
        let gh: GitHubRepository = self.handle_response(response).await?;
        Ok(gh.into())
    }

    async fn list_branches(&self, repo: &RepositoryRef) -> Result<Vec<Branch>, ForgeError> {
        let url = self.repo_url(repo, "branches");
        let branches: Vec<GitHubBranch> = self.get_paginated(&url).await?;
        Ok(branches
            .into_iter()
            .map(|b| Branch {
                name: b.name,
                protected: b.protected,
            })
            .collect())
    }

    async fn get_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<BranchProtection>, ForgeError> {
        let url = self.protection_url(repo, branch)?;
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // "Branch not protected"
            return Ok(None);
        }
        let gh: GitHubProtection = self.handle_response(response).await?;
        Ok(Some(gh.into()))
    }

    async fn list_teams(&self, repo: &RepositoryRef) -> Result<Vec<Team>, ForgeError> {
        let url = self.repo_url(repo, "teams");
        let teams: Vec<GitHubTeam> = self.get_paginated(&url).await?;
        Ok(teams
            .into_iter()
            .map(|t| Team {
                id: t.id,
                slug: t.slug,
                name: t.name,
                permission: t.permission.unwrap_or_else(|| "pull".to_string()),
            })
            .collect())
    }

    async fn list_topics(&self, repo: &RepositoryRef) -> Result<Vec<String>, ForgeError> {
        let url = self.repo_url(repo, "topics");
        let response = self.send(self.client.get(&url)).await?;
        let topics: GitHubTopics = self.handle_response(response).await?;
        Ok(topics.names)
    }

    async fn create_repository(
        &self,
        org: Option<&str>,
        request: CreateRepositoryRequest,
    ) -> Result<Repository, ForgeError> {
        let url = match org {
            Some(org) => format!("{}/orgs/{}/repos", self.api_base, org),
            None => format!("{}/user/repos", self.api_base),
        };
        let body = CreateRepositoryBody::new(&request);
        let response = self.send(self.client.post(&url).json(&body)).await?;
        let gh: GitHubRepository = self.handle_response(response).await?;
        Ok(gh.into())
    }

    async fn add_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &RepositoryRef,
        permission: &str,
    ) -> Result<(), ForgeError> {
        let url = format!(
            "{}/orgs/{}/teams/{}/repos/{}/{}",
            self.api_base,
            org,
            team_slug,
            repo.owner(),
            repo.name()
        );
        let body = TeamPermissionBody { permission };
        let response = self.send(self.client.put(&url).json(&body)).await?;
        self.handle_empty_response(response).await
    }

    async fn replace_topics(
        &self,
        repo: &RepositoryRef,
        topics: &[String],
    ) -> Result<Vec<String>, ForgeError> {
        let url = self.repo_url(repo, "topics");
        let body = TopicsBody { names: topics };
        let response = self.send(self.client.put(&url).json(&body)).await?;
        let stored: GitHubTopics = self.handle_response(response).await?;
        Ok(stored.names)
    }

    async fn update_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        request: ProtectionRequest,
    ) -> Result<(), ForgeError> {
        let url = self.protection_url(repo, branch)?;
        let body = ProtectionBody::from(&request);
        let response = self.send(self.client.put(url).json(&body)).await?;
        self.handle_empty_response(response).await
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a repository.
#[derive(Serialize)]
struct CreateRepositoryBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_wiki: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_downloads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_merge_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_rebase_merge: Option<bool>,
    auto_init: bool,
}

impl<'a> CreateRepositoryBody<'a> {
    // has_pages is not accepted on create; Pages is configured separately.
    fn new(request: &'a CreateRepositoryRequest) -> Self {
        let s = &request.settings;
        Self {
            name: &request.name,
            description: s.description.as_deref(),
            homepage: s.homepage.as_deref(),
            private: s.private,
            has_issues: s.has_issues,
            has_wiki: s.has_wiki,
            has_downloads: s.has_downloads,
            allow_merge_commit: s.allow_merge_commit,
            allow_squash_merge: s.allow_squash_merge,
            allow_rebase_merge: s.allow_rebase_merge,
            auto_init: false,
        }
    }
}

/// Request body for granting a team access.
#[derive(Serialize)]
struct TeamPermissionBody<'a> {
    permission: &'a str,
}

/// Request body for replacing topics.
#[derive(Serialize)]
struct TopicsBody<'a> {
    names: &'a [String],
}

/// Request body for updating branch protection.
///
/// The four core rules must always be present; `null` disables them.
#[derive(Serialize)]
struct ProtectionBody {
    required_status_checks: Option<StatusChecksBody>,
    enforce_admins: bool,
    required_pull_request_reviews: Option<ReviewPolicyBody>,
    restrictions: Option<RestrictionsBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_linear_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_force_pushes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_deletions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_conversation_resolution: Option<bool>,
}

#[derive(Serialize)]
struct StatusChecksBody {
    strict: bool,
    contexts: Vec<String>,
}

#[derive(Serialize)]
struct ReviewPolicyBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    dismissal_restrictions: Option<RestrictionsBody>,
    dismiss_stale_reviews: bool,
    require_code_owner_reviews: bool,
    required_approving_review_count: u32,
}

#[derive(Serialize)]
struct RestrictionsBody {
    users: Vec<String>,
    teams: Vec<String>,
}

impl From<&RestrictionsRequest> for RestrictionsBody {
    fn from(r: &RestrictionsRequest) -> Self {
        Self {
            users: r.users.clone(),
            teams: r.teams.clone(),
        }
    }
}

impl From<&ProtectionRequest> for ProtectionBody {
    fn from(req: &ProtectionRequest) -> Self {
        Self {
            required_status_checks: req.required_status_checks.as_ref().map(|c| {
                StatusChecksBody {
                    strict: c.strict,
                    contexts: c.contexts.clone(),
                }
            }),
            enforce_admins: req.enforce_admins,
            required_pull_request_reviews: req.required_pull_request_reviews.as_ref().map(
                |r| ReviewPolicyBody {
                    dismissal_restrictions: r.dismissal_restrictions.as_ref().map(Into::into),
                    dismiss_stale_reviews: r.dismiss_stale_reviews,
                    require_code_owner_reviews: r.require_code_owner_reviews,
                    required_approving_review_count: r.required_approving_review_count,
                },
            ),
            restrictions: req.restrictions.as_ref().map(Into::into),
            required_linear_history: req.required_linear_history,
            allow_force_pushes: req.allow_force_pushes,
            allow_deletions: req.allow_deletions,
            required_conversation_resolution: req.required_conversation_resolution,
        }
    }
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
    #[serde(default)]
    errors: Vec<GitHubErrorDetail>,
}

#[derive(Deserialize)]
struct GitHubErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl GitHubErrorResponse {
    /// Top-level message plus any per-field detail messages.
    fn describe(&self) -> String {
        let details: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.message.as_deref().or(e.code.as_deref()))
            .collect();
        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join("; "))
        }
    }
}

/// A user or organization account.
#[derive(Deserialize)]
struct GitHubAccount {
    login: String,
    id: u64,
}

#[derive(Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: String,
    owner: GitHubAccount,
    default_branch: String,
    ssh_url: String,
    clone_url: String,
    html_url: String,
    description: Option<String>,
    homepage: Option<String>,
    private: Option<bool>,
    has_issues: Option<bool>,
    has_wiki: Option<bool>,
    has_pages: Option<bool>,
    has_downloads: Option<bool>,
    allow_merge_commit: Option<bool>,
    allow_squash_merge: Option<bool>,
    allow_rebase_merge: Option<bool>,
}

impl From<GitHubRepository> for Repository {
    fn from(gh: GitHubRepository) -> Self {
        Repository {
            owner: gh.owner.login,
            name: gh.name,
            full_name: gh.full_name,
            default_branch: gh.default_branch,
            ssh_url: gh.ssh_url,
            clone_url: gh.clone_url,
            html_url: gh.html_url,
            settings: RepositorySettings {
                description: gh.description,
                homepage: gh.homepage,
                private: gh.private,
                has_issues: gh.has_issues,
                has_wiki: gh.has_wiki,
                has_pages: gh.has_pages,
                has_downloads: gh.has_downloads,
                allow_merge_commit: gh.allow_merge_commit,
                allow_squash_merge: gh.allow_squash_merge,
                allow_rebase_merge: gh.allow_rebase_merge,
            },
        }
    }
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
    #[serde(default)]
    protected: bool,
}

#[derive(Deserialize)]
struct GitHubTeam {
    id: u64,
    slug: String,
    name: String,
    permission: Option<String>,
}

#[derive(Deserialize)]
struct GitHubTopics {
    #[serde(default)]
    names: Vec<String>,
}

/// `{ "enabled": bool }` wrapper used by several protection rules.
#[derive(Deserialize)]
struct GitHubEnabled {
    enabled: bool,
}

#[derive(Deserialize)]
struct GitHubProtection {
    required_status_checks: Option<GitHubStatusChecks>,
    required_pull_request_reviews: Option<GitHubReviewPolicy>,
    enforce_admins: Option<GitHubEnabled>,
    restrictions: Option<GitHubRestrictions>,
    required_linear_history: Option<GitHubEnabled>,
    allow_force_pushes: Option<GitHubEnabled>,
    allow_deletions: Option<GitHubEnabled>,
    required_conversation_resolution: Option<GitHubEnabled>,
}

#[derive(Deserialize)]
struct GitHubStatusChecks {
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    contexts: Vec<String>,
}

#[derive(Deserialize)]
struct GitHubReviewPolicy {
    dismissal_restrictions: Option<GitHubRestrictions>,
    #[serde(default)]
    dismiss_stale_reviews: bool,
    #[serde(default)]
    require_code_owner_reviews: bool,
    #[serde(default)]
    required_approving_review_count: u32,
}

#[derive(Deserialize)]
struct GitHubRestrictions {
    #[serde(default)]
    users: Vec<GitHubAccount>,
    #[serde(default)]
    teams: Vec<GitHubTeam>,
}

impl From<GitHubRestrictions> for Restrictions {
    fn from(gh: GitHubRestrictions) -> Self {
        Restrictions {
            users: gh
                .users
                .into_iter()
                .map(|u| UserRef {
                    login: u.login,
                    id: u.id,
                })
                .collect(),
            teams: gh
                .teams
                .into_iter()
                .map(|t| TeamRef {
                    id: t.id,
                    slug: t.slug,
                    name: t.name,
                })
                .collect(),
        }
    }
}

impl From<GitHubProtection> for BranchProtection {
    fn from(gh: GitHubProtection) -> Self {
        BranchProtection {
            required_status_checks: gh.required_status_checks.map(|c| StatusChecks {
                strict: c.strict,
                contexts: c.contexts,
            }),
            required_pull_request_reviews: gh.required_pull_request_reviews.map(|r| ReviewPolicy {
                required_approving_review_count: r.required_approving_review_count,
                dismiss_stale_reviews: r.dismiss_stale_reviews,
                require_code_owner_reviews: r.require_code_owner_reviews,
                dismissal_restrictions: r.dismissal_restrictions.map(Into::into),
            }),
            enforce_admins: gh.enforce_admins.is_some_and(|e| e.enabled),
            restrictions: gh.restrictions.map(Into::into),
            required_linear_history: gh.required_linear_history.map(|e| e.enabled),
            allow_force_pushes: gh.allow_force_pushes.map(|e| e.enabled),
            allow_deletions: gh.allow_deletions.map(|e| e.enabled),
            required_conversation_resolution: gh.required_conversation_resolution.map(|e| e.enabled),
        }
    }
}
