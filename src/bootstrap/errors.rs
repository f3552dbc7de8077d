//! bootstrap::errors
//!
//! Pipeline errors. Each variant names the step that failed and keeps the
//! underlying forge or bridge error as its source.

use thiserror::Error;

use crate::core::types::TypeError;
use crate::forge::ForgeError;
use crate::git::BridgeError;

/// Errors from inspecting the origin or provisioning the target.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    InvalidReference(#[from] TypeError),

    /// A read against the origin failed.
    #[error("cannot read {what}")]
    NotFound {
        what: String,
        #[source]
        source: ForgeError,
    },

    #[error("cannot look up organization '{org}'")]
    OrganizationLookup {
        org: String,
        #[source]
        source: ForgeError,
    },

    #[error("failed to create repository '{name}'")]
    CreateFailed {
        name: String,
        #[source]
        source: ForgeError,
    },

    #[error("failed to copy repository content")]
    ContentCopyFailed {
        #[source]
        source: BridgeError,
    },

    #[error("failed to grant team '{team}' access")]
    TeamGrantFailed {
        team: String,
        #[source]
        source: ForgeError,
    },

    #[error("failed to set topics")]
    TopicsFailed {
        #[source]
        source: ForgeError,
    },

    #[error("failed to protect branch '{branch}'")]
    ProtectionApplyFailed {
        branch: String,
        #[source]
        source: ForgeError,
    },

    #[error(transparent)]
    Forge(#[from] ForgeError),
}
