//! git::bridge
//!
//! Copies the working-tree content of one repository into a fresh, empty
//! repository as a single root commit.
//!
//! # Steps
//!
//! 1. Clone the origin default branch into a temporary directory
//!    (shallow unless configured otherwise)
//! 2. Drop the clone's `.git` so no history survives
//! 3. Initialize a new repository whose `HEAD` names the same branch
//! 4. Move every top-level entry of the clone into it
//! 5. Stage everything and create one parentless commit
//! 6. Add remote `origin` pointing at the target and force-push the branch
//!
//! Both temporary directories are removed when the copy finishes, whether
//! it succeeded or not.
//!
//! # Credentials
//!
//! SSH transports authenticate through the running SSH agent. HTTPS
//! transports authenticate as `x-access-token` with the API token.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{
    Cred, CredentialType, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
    RepositoryInitOptions, Signature,
};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

/// Remote name used for the push.
pub const REMOTE_NAME: &str = "origin";

/// Credential callback invocations allowed before giving up.
///
/// libgit2 keeps asking as long as the callback hands out credentials, so
/// a rejected token would otherwise loop forever.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// The stage of the copy that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStep {
    TempDir,
    Clone,
    Init,
    Move,
    Stage,
    Commit,
    Remote,
    Push,
}

impl fmt::Display for BridgeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeStep::TempDir => "temporary directory",
            BridgeStep::Clone => "clone",
            BridgeStep::Init => "init",
            BridgeStep::Move => "move",
            BridgeStep::Stage => "stage",
            BridgeStep::Commit => "commit",
            BridgeStep::Remote => "remote",
            BridgeStep::Push => "push",
        };
        f.write_str(name)
    }
}

/// A content copy failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step} failed: {message}")]
pub struct BridgeError {
    pub step: BridgeStep,
    pub message: String,
}

impl BridgeError {
    pub fn new(step: BridgeStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }

    fn from_git2(step: BridgeStep, err: git2::Error) -> Self {
        Self::new(step, err.message())
    }

    fn from_io(step: BridgeStep, context: &Path, err: std::io::Error) -> Self {
        Self::new(step, format!("{}: {}", context.display(), err))
    }
}

/// What to copy and where.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentCopyRequest {
    /// Transport address of the origin
    pub origin_url: String,
    /// Transport address of the (empty) target
    pub target_url: String,
    /// `owner/name` of the origin, used in the commit message
    pub origin_name: String,
    /// Branch to clone, create, and push
    pub branch: String,
    /// Token for HTTPS transports
    pub token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl fmt::Debug for ContentCopyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCopyRequest")
            .field("origin_url", &self.origin_url)
            .field("target_url", &self.target_url)
            .field("origin_name", &self.origin_name)
            .field("branch", &self.branch)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Result of a successful content copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCopyOutcome {
    /// Branch pushed to the target
    pub branch: String,
    /// Hex id of the root commit
    pub commit: String,
}

/// Moves repository content between two transport addresses.
pub trait ContentBridge: Send + Sync {
    /// Copy the origin's `branch` tree into the target as a single root
    /// commit on the same branch.
    fn copy_content(
        &self,
        request: &ContentCopyRequest,
    ) -> Result<ContentCopyOutcome, BridgeError>;
}

/// Commit message for the root commit of a bootstrapped repository.
pub fn commit_message(origin_name: &str) -> String {
    format!("chore: clone from origin repository {}", origin_name)
}

/// Whether `url` names a repository on the local filesystem.
fn is_local_origin(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute() || Path::new(url).exists()
}

/// [`ContentBridge`] backed by libgit2.
#[derive(Debug, Clone)]
pub struct GitBridge {
    temp_root: PathBuf,
    clone_depth: Option<u32>,
    author_name: String,
    author_email: String,
}

impl GitBridge {
    /// Bridge placing its working directories under `temp_root`.
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
            clone_depth: Some(1),
            author_name: "gh-bootstrap".to_string(),
            author_email: "gh-bootstrap@users.noreply.github.com".to_string(),
        }
    }

    /// Clone depth; `None` fetches full history.
    ///
    /// Only network transports can serve shallow fetches, so local origins
    /// are always cloned in full.
    pub fn with_clone_depth(mut self, depth: Option<u32>) -> Self {
        self.clone_depth = depth;
        self
    }

    /// Commit identity used when git configuration has none.
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    fn temp_dir(&self, prefix: &str) -> Result<TempDir, BridgeError> {
        fs::create_dir_all(&self.temp_root)
            .map_err(|e| BridgeError::from_io(BridgeStep::TempDir, &self.temp_root, e))?;
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.temp_root)
            .map_err(|e| BridgeError::from_io(BridgeStep::TempDir, &self.temp_root, e))
    }

    fn clone_origin(&self, request: &ContentCopyRequest, dest: &Path) -> Result<(), BridgeError> {
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(request.token.as_deref()));
        match self.clone_depth {
            Some(depth) if !is_local_origin(&request.origin_url) => {
                fetch.depth(i32::try_from(depth).unwrap_or(i32::MAX));
            }
            Some(_) => debug!(url = %request.origin_url, "local origin, cloning full history"),
            None => {}
        }

        RepoBuilder::new()
            .branch(&request.branch)
            .fetch_options(fetch)
            .clone(&request.origin_url, dest)
            .map_err(|e| BridgeError::from_git2(BridgeStep::Clone, e))?;

        let git_dir = dest.join(".git");
        fs::remove_dir_all(&git_dir)
            .map_err(|e| BridgeError::from_io(BridgeStep::Clone, &git_dir, e))
    }

    fn signature(&self, repo: &Repository) -> Result<Signature<'static>, BridgeError> {
        match repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => {
                debug!("no git identity configured, using fallback author");
                Signature::now(&self.author_name, &self.author_email)
                    .map_err(|e| BridgeError::from_git2(BridgeStep::Commit, e))
            }
        }
    }

    fn commit_all(&self, repo: &Repository, message: &str) -> Result<git2::Oid, BridgeError> {
        let mut index = repo
            .index()
            .map_err(|e| BridgeError::from_git2(BridgeStep::Stage, e))?;
        // FORCE: files the origin tracks stay tracked even if its own
        // .gitignore matches them.
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT | IndexAddOption::FORCE, None)
            .map_err(|e| BridgeError::from_git2(BridgeStep::Stage, e))?;
        index
            .write()
            .map_err(|e| BridgeError::from_git2(BridgeStep::Stage, e))?;
        let tree_id = index
            .write_tree()
            .map_err(|e| BridgeError::from_git2(BridgeStep::Stage, e))?;

        let tree = repo
            .find_tree(tree_id)
            .map_err(|e| BridgeError::from_git2(BridgeStep::Commit, e))?;
        let sig = self.signature(repo)?;
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .map_err(|e| BridgeError::from_git2(BridgeStep::Commit, e))?;
        debug!(%oid, "created root commit");
        Ok(oid)
    }

    fn push(&self, repo: &Repository, request: &ContentCopyRequest) -> Result<(), BridgeError> {
        let mut remote = repo
            .remote(REMOTE_NAME, &request.target_url)
            .map_err(|e| BridgeError::from_git2(BridgeStep::Remote, e))?;

        let refspec = format!("+refs/heads/{0}:refs/heads/{0}", request.branch);
        let mut rejected = Vec::new();
        {
            let mut callbacks = remote_callbacks(request.token.as_deref());
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected.push(format!("{} ({})", refname, status));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| BridgeError::from_git2(BridgeStep::Push, e))?;
        }

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::new(
                BridgeStep::Push,
                format!("remote rejected {}", rejected.join(", ")),
            ))
        }
    }
}

impl ContentBridge for GitBridge {
    fn copy_content(
        &self,
        request: &ContentCopyRequest,
    ) -> Result<ContentCopyOutcome, BridgeError> {
        let origin_dir = self.temp_dir("gh-bootstrap-origin-")?;
        let work_dir = self.temp_dir("gh-bootstrap-work-")?;

        debug!(origin = %request.origin_url, branch = %request.branch, "cloning origin");
        self.clone_origin(request, origin_dir.path())?;

        let mut init = RepositoryInitOptions::new();
        init.initial_head(&request.branch);
        let repo = Repository::init_opts(work_dir.path(), &init)
            .map_err(|e| BridgeError::from_git2(BridgeStep::Init, e))?;

        move_entries(origin_dir.path(), work_dir.path())?;
        let commit = self.commit_all(&repo, &commit_message(&request.origin_name))?;

        debug!(target = %request.target_url, "pushing root commit");
        self.push(&repo, request)?;

        info!(branch = %request.branch, %commit, "content pushed");
        Ok(ContentCopyOutcome {
            branch: request.branch.clone(),
            commit: commit.to_string(),
        })
    }
}

/// Move every top-level entry of `from` into `to`.
fn move_entries(from: &Path, to: &Path) -> Result<(), BridgeError> {
    let entries = fs::read_dir(from).map_err(|e| BridgeError::from_io(BridgeStep::Move, from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BridgeError::from_io(BridgeStep::Move, from, e))?;
        let source = entry.path();
        fs::rename(&source, to.join(entry.file_name()))
            .map_err(|e| BridgeError::from_io(BridgeStep::Move, &source, e))?;
    }
    Ok(())
}

fn remote_callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "authentication failed: credentials rejected",
            ));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(token) = token {
                return Cred::userpass_plaintext("x-access-token", token);
            }
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::from_str("no usable credentials for remote"))
    });
    callbacks
}
