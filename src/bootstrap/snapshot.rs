//! bootstrap::snapshot
//!
//! The read-only record of an origin repository, and the translation of its
//! branch protections into requests for the target.

use crate::core::types::RepositoryRef;
use crate::forge::{
    BranchProtection, ProtectionRequest, Repository, Restrictions, RestrictionsRequest,
    ReviewPolicyRequest, Team,
};

/// Protection of one named branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchProtectionRule {
    pub branch: String,
    pub protection: BranchProtection,
}

impl BranchProtectionRule {
    pub fn new(branch: impl Into<String>, protection: BranchProtection) -> Self {
        Self {
            branch: branch.into(),
            protection,
        }
    }

    /// The request that reproduces this protection on another repository.
    ///
    /// Users are addressed by login and teams by slug. Restriction lists
    /// with nobody in them become `None`.
    pub fn to_request(&self) -> ProtectionRequest {
        let p = &self.protection;
        ProtectionRequest {
            required_status_checks: p.required_status_checks.clone(),
            enforce_admins: p.enforce_admins,
            required_pull_request_reviews: p.required_pull_request_reviews.as_ref().map(|r| {
                ReviewPolicyRequest {
                    required_approving_review_count: r.required_approving_review_count,
                    dismiss_stale_reviews: r.dismiss_stale_reviews,
                    require_code_owner_reviews: r.require_code_owner_reviews,
                    dismissal_restrictions: r
                        .dismissal_restrictions
                        .as_ref()
                        .and_then(restriction_request),
                }
            }),
            restrictions: p.restrictions.as_ref().and_then(restriction_request),
            required_linear_history: p.required_linear_history,
            allow_force_pushes: p.allow_force_pushes,
            allow_deletions: p.allow_deletions,
            required_conversation_resolution: p.required_conversation_resolution,
        }
    }
}

/// Logins and slugs for a restriction, or `None` when it names nobody.
pub fn restriction_request(restrictions: &Restrictions) -> Option<RestrictionsRequest> {
    if restrictions.is_empty() {
        return None;
    }
    Some(RestrictionsRequest {
        users: restrictions.users.iter().map(|u| u.login.clone()).collect(),
        teams: restrictions.teams.iter().map(|t| t.slug.clone()).collect(),
    })
}

/// Everything read from the origin, captured once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSnapshot {
    reference: RepositoryRef,
    repository: Repository,
    topics: Vec<String>,
    teams: Vec<Team>,
    protections: Vec<BranchProtectionRule>,
}

impl OriginSnapshot {
    /// Build a snapshot. Duplicate topics are dropped, keeping first
    /// occurrence order.
    pub fn new(
        reference: RepositoryRef,
        repository: Repository,
        topics: Vec<String>,
        teams: Vec<Team>,
        protections: Vec<BranchProtectionRule>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(topics.len());
        for topic in topics {
            if !unique.contains(&topic) {
                unique.push(topic);
            }
        }
        Self {
            reference,
            repository,
            topics: unique,
            teams,
            protections,
        }
    }

    /// The origin reference with its owner resolved.
    pub fn reference(&self) -> &RepositoryRef {
        &self.reference
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Protected branches, in branch listing order.
    pub fn protections(&self) -> &[BranchProtectionRule] {
        &self.protections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::{RepositorySettings, ReviewPolicy, StatusChecks, TeamRef, UserRef};

    fn user(login: &str) -> UserRef {
        UserRef {
            login: login.into(),
            id: 1,
        }
    }

    fn team(slug: &str) -> TeamRef {
        TeamRef {
            id: 2,
            slug: slug.into(),
            name: format!("{} team", slug),
        }
    }

    #[test]
    fn restriction_translation_uses_logins_and_slugs() {
        let r = Restrictions {
            users: vec![user("u1"), user("u2")],
            teams: vec![team("t1")],
        };
        let req = restriction_request(&r).unwrap();
        assert_eq!(req.users, vec!["u1", "u2"]);
        assert_eq!(req.teams, vec!["t1"]);
    }

    #[test]
    fn empty_restriction_is_omitted() {
        assert!(restriction_request(&Restrictions::default()).is_none());
    }

    #[test]
    fn to_request_carries_rules() {
        let rule = BranchProtectionRule::new(
            "main",
            BranchProtection {
                required_status_checks: Some(StatusChecks {
                    strict: true,
                    contexts: vec!["ci".into()],
                }),
                required_pull_request_reviews: Some(ReviewPolicy {
                    required_approving_review_count: 2,
                    dismiss_stale_reviews: true,
                    require_code_owner_reviews: true,
                    dismissal_restrictions: Some(Restrictions {
                        users: vec![],
                        teams: vec![team("leads")],
                    }),
                }),
                enforce_admins: true,
                restrictions: Some(Restrictions::default()),
                allow_deletions: Some(false),
                ..Default::default()
            },
        );

        let req = rule.to_request();
        assert!(req.enforce_admins);
        assert_eq!(req.required_status_checks.unwrap().contexts, vec!["ci"]);
        let reviews = req.required_pull_request_reviews.unwrap();
        assert_eq!(reviews.required_approving_review_count, 2);
        assert!(reviews.dismiss_stale_reviews);
        assert!(reviews.require_code_owner_reviews);
        assert_eq!(reviews.dismissal_restrictions.unwrap().teams, vec!["leads"]);
        assert!(req.restrictions.is_none());
        assert_eq!(req.allow_deletions, Some(false));
    }

    #[test]
    fn snapshot_dedupes_topics_in_order() {
        let reference = RepositoryRef::parse("acme/demo").unwrap();
        let repository = Repository {
            owner: "acme".into(),
            name: "demo".into(),
            full_name: "acme/demo".into(),
            default_branch: "main".into(),
            ssh_url: String::new(),
            clone_url: String::new(),
            html_url: String::new(),
            settings: RepositorySettings::default(),
        };
        let snapshot = OriginSnapshot::new(
            reference,
            repository,
            vec!["infra".into(), "go".into(), "infra".into()],
            vec![],
            vec![],
        );
        assert_eq!(snapshot.topics(), ["infra".to_string(), "go".to_string()]);
    }
}
