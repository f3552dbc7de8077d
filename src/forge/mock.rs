//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores repositories in memory, records every call,
//! and allows configuring failure scenarios.
//!
//! # Example
//!
//! ```
//! use gh_bootstrap::core::types::RepositoryRef;
//! use gh_bootstrap::forge::mock::{MockForge, MockRepository};
//! use gh_bootstrap::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new()
//!     .with_organization("acme")
//!     .with_repository(MockRepository::new("acme", "template").with_topics(["rust"]));
//!
//! let origin = RepositoryRef::parse("acme/template").unwrap();
//! let topics = forge.list_topics(&origin).await.unwrap();
//! assert_eq!(topics, vec!["rust".to_string()]);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::traits::{
    Branch, BranchProtection, CreateRepositoryRequest, Forge, ForgeError, Organization,
    ProtectionRequest, Repository, RepositorySettings, Team, User,
};
use crate::core::types::RepositoryRef;

/// Login returned by `authenticated_user` unless overridden.
pub const DEFAULT_LOGIN: &str = "octocat";

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Login of the authenticated account.
    login: String,
    /// Known organization logins.
    organizations: HashSet<String>,
    /// Stored repositories by `owner/name`.
    repositories: HashMap<String, MockRepository>,
    /// Operations to fail (for testing error paths).
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
    /// Next numeric id to hand out.
    next_id: u64,
    /// Directory that transport addresses of created repositories point into.
    url_root: Option<String>,
}

/// A repository held by the mock, with everything the forge can report
/// about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRepository {
    pub repository: Repository,
    pub branches: Vec<Branch>,
    pub protections: BTreeMap<String, BranchProtection>,
    pub teams: Vec<Team>,
    pub topics: Vec<String>,
    /// Protection requests applied through `update_branch_protection`,
    /// in call order.
    pub applied_protections: Vec<(String, ProtectionRequest)>,
}

impl MockRepository {
    /// A repository on `main` with one unprotected branch and
    /// github.com-style transport addresses.
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            repository: Repository {
                owner: owner.to_string(),
                name: name.to_string(),
                full_name: format!("{}/{}", owner, name),
                default_branch: "main".to_string(),
                ssh_url: format!("git@github.com:{}/{}.git", owner, name),
                clone_url: format!("https://github.com/{}/{}.git", owner, name),
                html_url: format!("https://github.com/{}/{}", owner, name),
                settings: RepositorySettings::default(),
            },
            branches: vec![Branch {
                name: "main".to_string(),
                protected: false,
            }],
            protections: BTreeMap::new(),
            teams: Vec::new(),
            topics: Vec::new(),
            applied_protections: Vec::new(),
        }
    }

    /// Replace the copied metadata.
    pub fn with_settings(mut self, settings: RepositorySettings) -> Self {
        self.repository.settings = settings;
        self
    }

    /// Change the default branch (adding it to the branch list if needed).
    pub fn with_default_branch(mut self, branch: &str) -> Self {
        self.repository.default_branch = branch.to_string();
        self.branches.retain(|b| b.name != "main" || branch == "main");
        self.ensure_branch(branch);
        self
    }

    /// Override both transport addresses (e.g., with local paths).
    pub fn with_urls(mut self, ssh_url: impl Into<String>, clone_url: impl Into<String>) -> Self {
        self.repository.ssh_url = ssh_url.into();
        self.repository.clone_url = clone_url.into();
        self
    }

    /// Add an unprotected branch.
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.ensure_branch(branch);
        self
    }

    /// Protect a branch (adding it if needed).
    pub fn with_protection(mut self, branch: &str, protection: BranchProtection) -> Self {
        self.ensure_branch(branch);
        if let Some(b) = self.branches.iter_mut().find(|b| b.name == branch) {
            b.protected = true;
        }
        self.protections.insert(branch.to_string(), protection);
        self
    }

    /// Grant a team access.
    pub fn with_team(mut self, team: Team) -> Self {
        self.teams.push(team);
        self
    }

    /// Replace the topic set.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    fn ensure_branch(&mut self, branch: &str) {
        if !self.branches.iter().any(|b| b.name == branch) {
            self.branches.push(Branch {
                name: branch.to_string(),
                protected: false,
            });
        }
    }
}

/// Configuration for which operation should fail.
///
/// Variants carrying an optional key fail only for that branch or team when
/// the key is set, and for every call otherwise.
#[derive(Debug, Clone)]
pub enum FailOn {
    AuthenticatedUser(ForgeError),
    GetOrganization(ForgeError),
    GetRepository(ForgeError),
    ListBranches(ForgeError),
    GetBranchProtection {
        branch: Option<String>,
        error: ForgeError,
    },
    ListTeams(ForgeError),
    ListTopics(ForgeError),
    CreateRepository(ForgeError),
    AddTeamRepository {
        team: Option<String>,
        error: ForgeError,
    },
    ReplaceTopics(ForgeError),
    UpdateBranchProtection {
        branch: Option<String>,
        error: ForgeError,
    },
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    AuthenticatedUser,
    GetOrganization {
        org: String,
    },
    GetRepository {
        repo: String,
    },
    ListBranches {
        repo: String,
    },
    GetBranchProtection {
        repo: String,
        branch: String,
    },
    ListTeams {
        repo: String,
    },
    ListTopics {
        repo: String,
    },
    CreateRepository {
        org: Option<String>,
        name: String,
        settings: RepositorySettings,
    },
    AddTeamRepository {
        org: String,
        team: String,
        repo: String,
        permission: String,
    },
    ReplaceTopics {
        repo: String,
        topics: Vec<String>,
    },
    UpdateBranchProtection {
        repo: String,
        branch: String,
        request: ProtectionRequest,
    },
}

impl MockOperation {
    /// Whether this operation changes state on the forge.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MockOperation::CreateRepository { .. }
                | MockOperation::AddTeamRepository { .. }
                | MockOperation::ReplaceTopics { .. }
                | MockOperation::UpdateBranchProtection { .. }
        )
    }
}

impl MockForge {
    /// Create a new empty mock forge authenticated as [`DEFAULT_LOGIN`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                login: DEFAULT_LOGIN.to_string(),
                organizations: HashSet::new(),
                repositories: HashMap::new(),
                fail_on: Vec::new(),
                operations: Vec::new(),
                next_id: 1000,
                url_root: None,
            })),
        }
    }

    /// Set the authenticated login.
    pub fn with_login(self, login: &str) -> Self {
        self.inner.lock().unwrap().login = login.to_string();
        self
    }

    /// Register an organization.
    pub fn with_organization(self, org: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .organizations
            .insert(org.to_string());
        self
    }

    /// Store a repository.
    pub fn with_repository(self, repo: MockRepository) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let key = repo.repository.full_name.clone();
            inner.repositories.insert(key, repo);
        }
        self
    }

    /// Give repositories created from now on local transport addresses
    /// `{root}/{owner}/{name}.git` instead of github.com ones.
    pub fn with_url_root(self, root: impl Into<String>) -> Self {
        self.inner.lock().unwrap().url_root = Some(root.into());
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// Can be called repeatedly; the first matching entry wins.
    ///
    /// # Example
    ///
    /// ```
    /// use gh_bootstrap::forge::mock::{MockForge, FailOn};
    /// use gh_bootstrap::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::CreateRepository(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on.push(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Recorded operations that change forge state.
    pub fn write_operations(&self) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(MockOperation::is_write)
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    /// Get a stored repository by `owner/name` (for test verification).
    pub fn repository_sync(&self, full_name: &str) -> Option<MockRepository> {
        self.inner
            .lock()
            .unwrap()
            .repositories
            .get(full_name)
            .cloned()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    /// Return the first configured failure `select` picks out, if any.
    fn check_fail(&self, select: impl Fn(&FailOn) -> Option<&ForgeError>) -> Result<(), ForgeError> {
        let inner = self.inner.lock().unwrap();
        match inner.fail_on.iter().find_map(select) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn key(&self, repo: &RepositoryRef) -> String {
        let inner = self.inner.lock().unwrap();
        repo.resolve(&inner.login).to_string()
    }

    /// Run `f` against a stored repository, or fail with `NotFound`.
    fn with_stored<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut MockRepository) -> T,
    ) -> Result<T, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .repositories
            .get_mut(key)
            .map(f)
            .ok_or_else(|| ForgeError::NotFound(format!("repository {}", key)))
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

/// Matches keyed failures: `None` applies to every key.
fn key_matches(configured: &Option<String>, actual: &str) -> bool {
    configured.as_deref().map_or(true, |k| k == actual)
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authenticated_user(&self) -> Result<User, ForgeError> {
        self.record(MockOperation::AuthenticatedUser);
        self.check_fail(|f| match f {
            FailOn::AuthenticatedUser(e) => Some(e),
            _ => None,
        })?;

        let inner = self.inner.lock().unwrap();
        Ok(User {
            login: inner.login.clone(),
            id: 1,
        })
    }

    async fn get_organization(&self, org: &str) -> Result<Organization, ForgeError> {
        self.record(MockOperation::GetOrganization {
            org: org.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetOrganization(e) => Some(e),
            _ => None,
        })?;

        let inner = self.inner.lock().unwrap();
        if inner.organizations.contains(org) {
            Ok(Organization {
                login: org.to_string(),
                id: 2,
            })
        } else {
            Err(ForgeError::NotFound(format!("organization {}", org)))
        }
    }

    async fn get_repository(&self, repo: &RepositoryRef) -> Result<Repository, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::GetRepository { repo: key.clone() });
        self.check_fail(|f| match f {
            FailOn::GetRepository(e) => Some(e),
            _ => None,
        })?;

        self.with_stored(&key, |r| r.repository.clone())
    }

    async fn list_branches(&self, repo: &RepositoryRef) -> Result<Vec<Branch>, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::ListBranches { repo: key.clone() });
        self.check_fail(|f| match f {
            FailOn::ListBranches(e) => Some(e),
            _ => None,
        })?;

        self.with_stored(&key, |r| r.branches.clone())
    }

    async fn get_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<BranchProtection>, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::GetBranchProtection {
            repo: key.clone(),
            branch: branch.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetBranchProtection { branch: b, error } if key_matches(b, branch) => {
                Some(error)
            }
            _ => None,
        })?;

        self.with_stored(&key, |r| r.protections.get(branch).cloned())
    }

    async fn list_teams(&self, repo: &RepositoryRef) -> Result<Vec<Team>, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::ListTeams { repo: key.clone() });
        self.check_fail(|f| match f {
            FailOn::ListTeams(e) => Some(e),
            _ => None,
        })?;

        self.with_stored(&key, |r| r.teams.clone())
    }

    async fn list_topics(&self, repo: &RepositoryRef) -> Result<Vec<String>, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::ListTopics { repo: key.clone() });
        self.check_fail(|f| match f {
            FailOn::ListTopics(e) => Some(e),
            _ => None,
        })?;

        self.with_stored(&key, |r| r.topics.clone())
    }

    async fn create_repository(
        &self,
        org: Option<&str>,
        request: CreateRepositoryRequest,
    ) -> Result<Repository, ForgeError> {
        self.record(MockOperation::CreateRepository {
            org: org.map(str::to_string),
            name: request.name.clone(),
            settings: request.settings.clone(),
        });
        self.check_fail(|f| match f {
            FailOn::CreateRepository(e) => Some(e),
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        let owner = match org {
            Some(org) if !inner.organizations.contains(org) => {
                return Err(ForgeError::NotFound(format!("organization {}", org)));
            }
            Some(org) => org.to_string(),
            None => inner.login.clone(),
        };

        let key = format!("{}/{}", owner, request.name);
        if inner.repositories.contains_key(&key) {
            return Err(ForgeError::Conflict(
                "name already exists on this account".to_string(),
            ));
        }

        let mut stored = MockRepository::new(&owner, &request.name).with_settings(request.settings);
        if let Some(root) = &inner.url_root {
            let path = format!("{}/{}/{}.git", root, owner, request.name);
            stored = stored.with_urls(path.clone(), path);
        }
        // Created without auto_init: no branches until content is pushed.
        stored.branches.clear();
        let repository = stored.repository.clone();
        inner.repositories.insert(key, stored);
        Ok(repository)
    }

    async fn add_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &RepositoryRef,
        permission: &str,
    ) -> Result<(), ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::AddTeamRepository {
            org: org.to_string(),
            team: team_slug.to_string(),
            repo: key.clone(),
            permission: permission.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::AddTeamRepository { team, error } if key_matches(team, team_slug) => {
                Some(error)
            }
            _ => None,
        })?;

        let id = {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            inner.next_id
        };
        self.with_stored(&key, |r| {
            r.teams.retain(|t| t.slug != team_slug);
            r.teams.push(Team {
                id,
                slug: team_slug.to_string(),
                name: team_slug.to_string(),
                permission: permission.to_string(),
            });
        })
    }

    async fn replace_topics(
        &self,
        repo: &RepositoryRef,
        topics: &[String],
    ) -> Result<Vec<String>, ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::ReplaceTopics {
            repo: key.clone(),
            topics: topics.to_vec(),
        });
        self.check_fail(|f| match f {
            FailOn::ReplaceTopics(e) => Some(e),
            _ => None,
        })?;

        self.with_stored(&key, |r| {
            r.topics = topics.to_vec();
            r.topics.clone()
        })
    }

    async fn update_branch_protection(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        request: ProtectionRequest,
    ) -> Result<(), ForgeError> {
        let key = self.key(repo);
        self.record(MockOperation::UpdateBranchProtection {
            repo: key.clone(),
            branch: branch.to_string(),
            request: request.clone(),
        });
        self.check_fail(|f| match f {
            FailOn::UpdateBranchProtection { branch: b, error } if key_matches(b, branch) => {
                Some(error)
            }
            _ => None,
        })?;

        self.with_stored(&key, |r| {
            r.applied_protections.push((branch.to_string(), request));
        })
    }
}
