//! git
//!
//! Repository content transfer.
//!
//! # Architecture
//!
//! This module is the only user of `git2`. The bootstrap pipeline depends on
//! the [`ContentBridge`] trait; [`GitBridge`] is the libgit2 implementation.
//! No shelling out to the git CLI.
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::git::{ContentBridge, ContentCopyRequest, GitBridge};
//!
//! let bridge = GitBridge::new(std::env::temp_dir()).with_clone_depth(Some(1));
//! bridge.copy_content(&ContentCopyRequest {
//!     origin_url: "git@github.com:acme/template.git".into(),
//!     target_url: "git@github.com:acme/svc.git".into(),
//!     origin_name: "acme/template".into(),
//!     branch: "main".into(),
//!     token: None,
//! })?;
//! ```

mod bridge;

pub use bridge::{
    commit_message, BridgeError, BridgeStep, ContentBridge, ContentCopyOutcome,
    ContentCopyRequest, GitBridge, REMOTE_NAME,
};
