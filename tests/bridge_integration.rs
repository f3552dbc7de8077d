//! Integration tests for the libgit2 content bridge.
//!
//! Every test works on local repositories inside a TempDir: a non-bare
//! origin with a few commits and a bare target standing in for the freshly
//! created hosted repository.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

use gh_bootstrap::bootstrap::{ProvisionOptions, Provisioner};
use gh_bootstrap::core::types::RepositoryRef;
use gh_bootstrap::forge::mock::{MockForge, MockRepository};
use gh_bootstrap::git::{commit_message, BridgeStep, ContentBridge, ContentCopyRequest, GitBridge};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A scratch area holding an origin, a bare target, and the bridge's temp root.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn temp_root(&self) -> PathBuf {
        self.path("work")
    }

    fn bridge(&self) -> GitBridge {
        // Local transports cannot serve shallow fetches.
        GitBridge::new(self.temp_root()).with_clone_depth(None)
    }

    /// Create an origin on `main` with `files` committed over two commits.
    fn origin(&self, files: &[(&str, &str)]) -> PathBuf {
        let path = self.path("origin");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&path, &opts).expect("init origin");

        let (first, rest) = files.split_at(1);
        write_files(&path, first);
        commit(&repo, "first", IndexAddOption::DEFAULT);
        write_files(&path, rest);
        commit(&repo, "second", IndexAddOption::DEFAULT);
        path
    }

    fn bare_target(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create target dir");
        Repository::init_bare(&path).expect("init target");
        path
    }

    fn request(&self, origin: &Path, target: &Path) -> ContentCopyRequest {
        ContentCopyRequest {
            origin_url: origin.display().to_string(),
            target_url: target.display().to_string(),
            origin_name: "acme/template".to_string(),
            branch: "main".to_string(),
            token: None,
        }
    }

    fn temp_root_is_empty(&self) -> bool {
        fs::read_dir(self.temp_root())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

fn commit(repo: &Repository, message: &str, add: IndexAddOption) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index.add_all(["*"].iter(), add, None).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::new("Test", "test@example.com", &Time::new(0, 0)).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Names of the top-level entries of `branch` in `repo`.
fn tree_names(repo: &Repository, branch: &str) -> Vec<String> {
    let commit = repo
        .find_reference(&format!("refs/heads/{}", branch))
        .unwrap()
        .peel_to_commit()
        .unwrap();
    let mut names: Vec<String> = commit
        .tree()
        .unwrap()
        .iter()
        .filter_map(|e| e.name().map(str::to_string))
        .collect();
    names.sort();
    names
}

fn history_len(repo: &Repository, branch: &str) -> usize {
    let oid = repo
        .refname_to_id(&format!("refs/heads/{}", branch))
        .unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.push(oid).unwrap();
    walk.count()
}

// =============================================================================
// Content copy
// =============================================================================

mod copy_tests {
    use super::*;

    #[test]
    fn target_gets_origin_tree_as_single_root_commit() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b"), ("C.txt", "c")]);
        let target = fx.bare_target("target.git");

        let outcome = fx
            .bridge()
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        let repo = Repository::open_bare(&target).unwrap();
        assert_eq!(tree_names(&repo, "main"), vec!["A.txt", "B.txt", "C.txt"]);
        assert_eq!(history_len(&repo, "main"), 1);

        let head = repo
            .find_reference("refs/heads/main")
            .unwrap()
            .peel_to_commit()
            .unwrap();
        assert_eq!(head.parent_count(), 0);
        assert_eq!(head.id().to_string(), outcome.commit);
        assert_eq!(head.message(), Some(commit_message("acme/template").as_str()));
        assert_eq!(outcome.branch, "main");
    }

    #[test]
    fn default_depth_copies_from_local_origin() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        let target = fx.bare_target("target.git");

        GitBridge::new(fx.temp_root())
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        let repo = Repository::open_bare(&target).unwrap();
        assert_eq!(tree_names(&repo, "main"), vec!["A.txt", "B.txt"]);
        assert_eq!(history_len(&repo, "main"), 1);
        assert!(fx.temp_root_is_empty());
    }

    #[test]
    fn nested_directories_are_copied() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("README.md", "hi"), ("src/lib.rs", "// lib"), ("src/a/b.rs", "")]);
        let target = fx.bare_target("target.git");

        fx.bridge()
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        let repo = Repository::open_bare(&target).unwrap();
        assert_eq!(tree_names(&repo, "main"), vec!["README.md", "src"]);
        let commit = repo
            .find_reference("refs/heads/main")
            .unwrap()
            .peel_to_commit()
            .unwrap();
        let tree = commit.tree().unwrap();
        assert!(tree.get_path(Path::new("src/a/b.rs")).is_ok());
        assert!(tree.get_path(Path::new(".git")).is_err());
    }

    #[test]
    fn tracked_files_matching_gitignore_survive() {
        let fx = Fixture::new();
        let origin = fx.origin(&[(".gitignore", "*.log\n"), ("app.txt", "app")]);
        let repo = Repository::open(&origin).unwrap();
        write_files(&origin, &[("keep.log", "tracked anyway")]);
        commit(&repo, "force add", IndexAddOption::DEFAULT | IndexAddOption::FORCE);
        let target = fx.bare_target("target.git");

        fx.bridge()
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        let target = Repository::open_bare(&target).unwrap();
        assert_eq!(
            tree_names(&target, "main"),
            vec![".gitignore", "app.txt", "keep.log"]
        );
    }

    #[test]
    fn non_default_branch_is_copied_under_its_name() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        {
            let repo = Repository::open(&origin).unwrap();
            let head = repo.head().unwrap().peel_to_commit().unwrap();
            repo.branch("trunk", &head, false).unwrap();
        }
        let target = fx.bare_target("target.git");
        let mut request = fx.request(&origin, &target);
        request.branch = "trunk".to_string();

        let outcome = fx.bridge().copy_content(&request).unwrap();

        let repo = Repository::open_bare(&target).unwrap();
        assert_eq!(outcome.branch, "trunk");
        assert_eq!(tree_names(&repo, "trunk"), vec!["A.txt", "B.txt"]);
        assert!(repo.find_reference("refs/heads/main").is_err());
    }

    #[test]
    fn origin_is_left_untouched() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        let before = Repository::open(&origin)
            .unwrap()
            .refname_to_id("refs/heads/main")
            .unwrap();
        let target = fx.bare_target("target.git");

        fx.bridge()
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        let repo = Repository::open(&origin).unwrap();
        assert_eq!(repo.refname_to_id("refs/heads/main").unwrap(), before);
        assert_eq!(history_len(&repo, "main"), 2);
    }
}

// =============================================================================
// Temporary directory hygiene
// =============================================================================

mod cleanup_tests {
    use super::*;

    #[test]
    fn temp_root_empty_after_success() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        let target = fx.bare_target("target.git");

        fx.bridge()
            .copy_content(&fx.request(&origin, &target))
            .unwrap();

        assert!(fx.temp_root_is_empty());
    }

    #[test]
    fn missing_target_fails_at_push_and_cleans_up() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        let missing = fx.path("nowhere/target.git");

        let err = fx
            .bridge()
            .copy_content(&fx.request(&origin, &missing))
            .unwrap_err();

        assert_eq!(err.step, BridgeStep::Push);
        assert!(err.to_string().starts_with("push failed:"));
        assert!(fx.temp_root_is_empty());
    }

    #[test]
    fn missing_branch_fails_at_clone_and_cleans_up() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b")]);
        let target = fx.bare_target("target.git");
        let mut request = fx.request(&origin, &target);
        request.branch = "does-not-exist".to_string();

        let err = fx.bridge().copy_content(&request).unwrap_err();

        assert_eq!(err.step, BridgeStep::Clone);
        assert!(fx.temp_root_is_empty());
        let target = Repository::open_bare(&target).unwrap();
        assert!(target.references().unwrap().next().is_none());
    }
}

// =============================================================================
// Provisioning with real content
// =============================================================================

mod pipeline_tests {
    use super::*;
    use gh_bootstrap::bootstrap::{inspect_origin, InspectOptions};

    #[tokio::test]
    async fn provisioned_target_receives_origin_content() {
        let fx = Fixture::new();
        let origin = fx.origin(&[("A.txt", "a"), ("B.txt", "b"), ("C.txt", "c")]);
        let targets = fx.path("targets");
        let target = fx.bare_target("targets/acme/svc.git");

        let origin_url = origin.display().to_string();
        let forge = MockForge::new()
            .with_organization("acme")
            .with_url_root(targets.display().to_string())
            .with_repository(
                MockRepository::new("acme", "template").with_urls(origin_url.clone(), origin_url),
            );
        let bridge = fx.bridge();

        let snapshot = inspect_origin(
            &forge,
            &RepositoryRef::parse("acme/template").unwrap(),
            &InspectOptions::default(),
        )
        .await
        .unwrap();
        let created = Provisioner::new(&forge, &bridge, ProvisionOptions::default())
            .provision(&RepositoryRef::parse("acme/svc").unwrap(), &snapshot)
            .await
            .unwrap();

        let repo = Repository::open_bare(&target).unwrap();
        assert_eq!(tree_names(&repo, "main"), vec!["A.txt", "B.txt", "C.txt"]);
        assert_eq!(
            repo.refname_to_id("refs/heads/main").unwrap().to_string(),
            created.content.commit
        );
        assert!(fx.temp_root_is_empty());
    }
}
