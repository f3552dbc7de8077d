//! bootstrap::inspect
//!
//! Reads everything the target will inherit from the origin. Read-only.

use tracing::{debug, info, warn};

use super::errors::BootstrapError;
use super::snapshot::{BranchProtectionRule, OriginSnapshot};
use crate::core::types::RepositoryRef;
use crate::forge::Forge;

/// Options controlling origin inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectOptions {
    /// Treat protection lookup failures other than "not protected" as fatal.
    pub strict_protection_lookup: bool,
}

/// Capture the origin's metadata, branch protections, teams, and topics.
///
/// A reference without an owner is resolved against the authenticated user.
///
/// # Errors
///
/// Any failed read is fatal, except a protection lookup that fails for a
/// reason other than "not protected": that branch is logged and skipped
/// unless `strict_protection_lookup` is set.
pub async fn inspect_origin(
    forge: &dyn Forge,
    origin: &RepositoryRef,
    options: &InspectOptions,
) -> Result<OriginSnapshot, BootstrapError> {
    let origin = if origin.has_owner() {
        origin.clone()
    } else {
        let user = forge.authenticated_user().await?;
        origin.resolve(&user.login)
    };
    info!(origin = %origin, "inspecting origin repository");

    let repository = forge
        .get_repository(&origin)
        .await
        .map_err(|source| BootstrapError::NotFound {
            what: format!("origin repository '{}'", origin),
            source,
        })?;

    let branches = forge
        .list_branches(&origin)
        .await
        .map_err(|source| BootstrapError::NotFound {
            what: format!("branches of '{}'", origin),
            source,
        })?;

    let mut protections = Vec::new();
    for branch in &branches {
        match forge.get_branch_protection(&origin, &branch.name).await {
            Ok(Some(protection)) => {
                debug!(branch = %branch.name, "branch is protected");
                protections.push(BranchProtectionRule::new(branch.name.clone(), protection));
            }
            Ok(None) => debug!(branch = %branch.name, "branch is not protected"),
            Err(source) if options.strict_protection_lookup => {
                return Err(BootstrapError::NotFound {
                    what: format!("protection of branch '{}'", branch.name),
                    source,
                });
            }
            Err(error) => warn!(
                branch = %branch.name,
                %error,
                "cannot read branch protection, treating branch as unprotected"
            ),
        }
    }

    let teams = forge
        .list_teams(&origin)
        .await
        .map_err(|source| BootstrapError::NotFound {
            what: format!("teams of '{}'", origin),
            source,
        })?;

    let topics = forge
        .list_topics(&origin)
        .await
        .map_err(|source| BootstrapError::NotFound {
            what: format!("topics of '{}'", origin),
            source,
        })?;

    info!(
        branches = branches.len(),
        protected = protections.len(),
        teams = teams.len(),
        topics = topics.len(),
        "origin inspected"
    );

    Ok(OriginSnapshot::new(
        origin,
        repository,
        topics,
        teams,
        protections,
    ))
}
