//! bootstrap::provision
//!
//! Creates the target repository and replays the origin onto it.
//!
//! # Order
//!
//! 1. Resolve scope (user or organization)
//! 2. Create the repository with the origin's settings, empty
//! 3. Copy content through the [`ContentBridge`]
//! 4. Grant teams (organization scope only)
//! 5. Replace topics
//! 6. Apply branch protections in snapshot order
//!
//! Nothing is retried and nothing is rolled back: the first failure aborts
//! the run and leaves the target as far as it got.

use tracing::{debug, info};

use super::errors::BootstrapError;
use super::snapshot::OriginSnapshot;
use crate::core::config::Transport;
use crate::core::types::RepositoryRef;
use crate::forge::{CreateRepositoryRequest, Forge, Repository, RepositorySettings};
use crate::git::{ContentBridge, ContentCopyOutcome, ContentCopyRequest};

/// Who owns the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Owned by the authenticated user
    User { login: String },
    /// Owned by an organization
    Organization { org: String },
}

impl Scope {
    /// Owner login for the target.
    pub fn owner(&self) -> &str {
        match self {
            Scope::User { login } => login.as_str(),
            Scope::Organization { org } => org.as_str(),
        }
    }

    /// The organization, if organization-scoped.
    pub fn org(&self) -> Option<&str> {
        match self {
            Scope::User { .. } => None,
            Scope::Organization { org } => Some(org.as_str()),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::User { login } => write!(f, "user {}", login),
            Scope::Organization { org } => write!(f, "organization {}", org),
        }
    }
}

/// Options controlling provisioning.
#[derive(Clone, Default)]
pub struct ProvisionOptions {
    /// Transport used for clone and push
    pub transport: Transport,
    /// Token handed to the bridge for HTTPS transports
    pub token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for ProvisionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionOptions")
            .field("transport", &self.transport)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// A successfully provisioned target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedRepository {
    pub repository: Repository,
    pub scope: Scope,
    pub content: ContentCopyOutcome,
    /// Slugs of teams granted access, in grant order
    pub teams_granted: Vec<String>,
    /// Topic set as stored by the forge
    pub topics: Vec<String>,
    /// Branches protected, in apply order
    pub protected_branches: Vec<String>,
}

/// What a provisioning run would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub target: RepositoryRef,
    pub scope: Scope,
    pub origin: RepositoryRef,
    pub default_branch: String,
    pub settings: RepositorySettings,
    /// `(slug, permission)` pairs to grant; empty for user scope
    pub team_grants: Vec<(String, String)>,
    pub topics: Vec<String>,
    pub protected_branches: Vec<String>,
}

/// Provisions target repositories against a forge and a content bridge.
pub struct Provisioner<'a> {
    forge: &'a dyn Forge,
    bridge: &'a dyn ContentBridge,
    options: ProvisionOptions,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        forge: &'a dyn Forge,
        bridge: &'a dyn ContentBridge,
        options: ProvisionOptions,
    ) -> Self {
        Self {
            forge,
            bridge,
            options,
        }
    }

    /// Decide whether the target belongs to the user or an organization.
    ///
    /// An empty owner, or one equal to the authenticated login ignoring
    /// ASCII case, is user scope.
    pub async fn resolve_scope(
        &self,
        target: &RepositoryRef,
    ) -> Result<(Scope, RepositoryRef), BootstrapError> {
        let user = self.forge.authenticated_user().await?;

        if !target.has_owner() || target.owner().eq_ignore_ascii_case(&user.login) {
            let resolved = RepositoryRef::new(user.login.clone(), target.name())?;
            return Ok((Scope::User { login: user.login }, resolved));
        }

        let org = self
            .forge
            .get_organization(target.owner())
            .await
            .map_err(|source| BootstrapError::OrganizationLookup {
                org: target.owner().to_string(),
                source,
            })?;
        let resolved = RepositoryRef::new(org.login.clone(), target.name())?;
        Ok((Scope::Organization { org: org.login }, resolved))
    }

    /// Plan a run without writing anything.
    pub async fn plan(
        &self,
        target: &RepositoryRef,
        snapshot: &OriginSnapshot,
    ) -> Result<ProvisionPlan, BootstrapError> {
        let (scope, target) = self.resolve_scope(target).await?;
        let team_grants = match scope {
            Scope::User { .. } => Vec::new(),
            Scope::Organization { .. } => snapshot
                .teams()
                .iter()
                .map(|t| (t.slug.clone(), t.permission.clone()))
                .collect(),
        };

        Ok(ProvisionPlan {
            target,
            scope,
            origin: snapshot.reference().clone(),
            default_branch: snapshot.repository().default_branch.clone(),
            settings: snapshot.repository().settings.clone(),
            team_grants,
            topics: snapshot.topics().to_vec(),
            protected_branches: snapshot
                .protections()
                .iter()
                .map(|r| r.branch.clone())
                .collect(),
        })
    }

    /// Create the target and replay the snapshot onto it.
    pub async fn provision(
        &self,
        target: &RepositoryRef,
        snapshot: &OriginSnapshot,
    ) -> Result<ProvisionedRepository, BootstrapError> {
        let (scope, target) = self.resolve_scope(target).await?;
        info!(target = %target, scope = %scope, "creating repository");

        let repository = self
            .forge
            .create_repository(
                scope.org(),
                CreateRepositoryRequest {
                    name: target.name().to_string(),
                    settings: snapshot.repository().settings.clone(),
                },
            )
            .await
            .map_err(|source| BootstrapError::CreateFailed {
                name: target.to_string(),
                source,
            })?;

        let content = self.copy_content(snapshot, &repository)?;

        let mut teams_granted = Vec::new();
        if let Some(org) = scope.org() {
            for team in snapshot.teams() {
                debug!(team = %team.slug, permission = %team.permission, "granting team");
                self.forge
                    .add_team_repository(org, &team.slug, &target, &team.permission)
                    .await
                    .map_err(|source| BootstrapError::TeamGrantFailed {
                        team: team.slug.clone(),
                        source,
                    })?;
                teams_granted.push(team.slug.clone());
            }
        }

        let topics = self
            .forge
            .replace_topics(&target, snapshot.topics())
            .await
            .map_err(|source| BootstrapError::TopicsFailed { source })?;
        debug!(count = topics.len(), "topics applied");

        let mut protected_branches = Vec::new();
        for rule in snapshot.protections() {
            debug!(branch = %rule.branch, "applying branch protection");
            self.forge
                .update_branch_protection(&target, &rule.branch, rule.to_request())
                .await
                .map_err(|source| BootstrapError::ProtectionApplyFailed {
                    branch: rule.branch.clone(),
                    source,
                })?;
            protected_branches.push(rule.branch.clone());
        }

        info!(target = %target, "repository bootstrapped");
        Ok(ProvisionedRepository {
            repository,
            scope,
            content,
            teams_granted,
            topics,
            protected_branches,
        })
    }

    fn copy_content(
        &self,
        snapshot: &OriginSnapshot,
        target: &Repository,
    ) -> Result<ContentCopyOutcome, BootstrapError> {
        let origin = snapshot.repository();
        let request = ContentCopyRequest {
            origin_url: origin.transport_url(self.options.transport).to_string(),
            target_url: target.transport_url(self.options.transport).to_string(),
            origin_name: origin.full_name.clone(),
            branch: origin.default_branch.clone(),
            token: self.options.token.clone(),
        };
        info!(origin = %origin.full_name, branch = %request.branch, "copying content");
        self.bridge
            .copy_content(&request)
            .map_err(|source| BootstrapError::ContentCopyFailed { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation, MockRepository};
    use crate::forge::{ForgeError, Team};
    use crate::git::BridgeError;
    use std::sync::Mutex;

    /// Bridge that records requests instead of touching git.
    #[derive(Default)]
    struct RecordingBridge {
        requests: Mutex<Vec<ContentCopyRequest>>,
    }

    impl ContentBridge for RecordingBridge {
        fn copy_content(
            &self,
            request: &ContentCopyRequest,
        ) -> Result<ContentCopyOutcome, BridgeError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ContentCopyOutcome {
                branch: request.branch.clone(),
                commit: "0".repeat(40),
            })
        }
    }

    fn snapshot(teams: Vec<Team>) -> OriginSnapshot {
        let origin = MockRepository::new("acme", "template").repository;
        OriginSnapshot::new(
            RepositoryRef::parse("acme/template").unwrap(),
            origin,
            vec!["infra".into()],
            teams,
            vec![],
        )
    }

    fn core_team() -> Team {
        Team {
            id: 7,
            slug: "core".into(),
            name: "Core".into(),
            permission: "maintain".into(),
        }
    }

    #[tokio::test]
    async fn owner_matching_login_is_user_scope() {
        let forge = MockForge::new().with_login("Octocat");
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let (scope, resolved) = provisioner
            .resolve_scope(&RepositoryRef::parse("octocat/svc").unwrap())
            .await
            .unwrap();
        assert_eq!(
            scope,
            Scope::User {
                login: "Octocat".into()
            }
        );
        assert_eq!(resolved.to_string(), "Octocat/svc");
        assert!(!forge
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::GetOrganization { .. })));
    }

    #[tokio::test]
    async fn unknown_organization_fails_lookup() {
        let forge = MockForge::new();
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let err = provisioner
            .provision(&RepositoryRef::parse("ghost/svc").unwrap(), &snapshot(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::OrganizationLookup { .. }));
        assert!(forge.write_operations().is_empty());
    }

    #[tokio::test]
    async fn user_scope_grants_no_teams() {
        let forge = MockForge::new();
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let result = provisioner
            .provision(
                &RepositoryRef::parse("svc").unwrap(),
                &snapshot(vec![core_team()]),
            )
            .await
            .unwrap();

        assert!(result.teams_granted.is_empty());
        assert!(!forge
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::AddTeamRepository { .. })));
    }

    #[tokio::test]
    async fn org_scope_grants_team_by_slug() {
        let forge = MockForge::new().with_organization("acme");
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let result = provisioner
            .provision(
                &RepositoryRef::parse("acme/svc").unwrap(),
                &snapshot(vec![core_team()]),
            )
            .await
            .unwrap();

        assert_eq!(result.teams_granted, vec!["core"]);
        assert!(forge.operations().contains(&MockOperation::AddTeamRepository {
            org: "acme".into(),
            team: "core".into(),
            repo: "acme/svc".into(),
            permission: "maintain".into(),
        }));
    }

    #[tokio::test]
    async fn bridge_gets_transport_addresses() {
        let forge = MockForge::new().with_organization("acme");
        let bridge = RecordingBridge::default();
        let options = ProvisionOptions {
            transport: Transport::Https,
            token: Some("t0ken".into()),
        };
        let provisioner = Provisioner::new(&forge, &bridge, options);

        provisioner
            .provision(&RepositoryRef::parse("acme/svc").unwrap(), &snapshot(vec![]))
            .await
            .unwrap();

        let requests = bridge.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].origin_url, "https://github.com/acme/template.git");
        assert_eq!(requests[0].target_url, "https://github.com/acme/svc.git");
        assert_eq!(requests[0].origin_name, "acme/template");
        assert_eq!(requests[0].branch, "main");
        assert_eq!(requests[0].token.as_deref(), Some("t0ken"));
    }

    #[tokio::test]
    async fn create_conflict_stops_before_content() {
        let forge = MockForge::new()
            .with_organization("acme")
            .fail_on(FailOn::CreateRepository(ForgeError::Conflict(
                "name already exists on this account".into(),
            )));
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let err = provisioner
            .provision(&RepositoryRef::parse("acme/svc").unwrap(), &snapshot(vec![]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::CreateFailed {
                source: ForgeError::Conflict(_),
                ..
            }
        ));
        assert!(bridge.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn plan_writes_nothing() {
        let forge = MockForge::new().with_organization("acme");
        let bridge = RecordingBridge::default();
        let provisioner = Provisioner::new(&forge, &bridge, ProvisionOptions::default());

        let plan = provisioner
            .plan(
                &RepositoryRef::parse("acme/svc").unwrap(),
                &snapshot(vec![core_team()]),
            )
            .await
            .unwrap();

        assert_eq!(plan.target.to_string(), "acme/svc");
        assert_eq!(
            plan.team_grants,
            vec![("core".to_string(), "maintain".to_string())]
        );
        assert_eq!(plan.topics, vec!["infra"]);
        assert!(forge.write_operations().is_empty());
        assert!(bridge.requests.lock().unwrap().is_empty());
    }
}
