//! Source-control collaborator: the local git replica of the portfolio
//! repository.
//!
//! Only four things are needed from git: make the replica present and
//! current, stage the document, commit, and push. [`SourceControl`] is
//! that contract; [`GitReplica`] implements it on libgit2.

use std::path::{Path, PathBuf};

use auth_git2::GitAuthenticator;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{ErrorCode, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature};

use crate::config::Author;
use crate::error::{FolioError, FolioResult};

/// What a sync step did to the local replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// The replica did not exist and was cloned.
    Cloned,
    /// The replica already matched the remote branch.
    UpToDate,
    /// The replica moved forward to the remote branch head.
    FastForwarded { to: String },
    /// The remote has no counterpart for the current branch yet.
    NoUpstream,
}

/// Operations the sync workflow needs from source control. All of them
/// act on the local replica.
pub trait SourceControl {
    /// Clone the replica if it is absent, otherwise pull.
    fn ensure_present_and_current(&self) -> FolioResult<SyncReport>;
    /// Stage a path relative to the replica root.
    fn stage(&self, rel_path: &Path) -> FolioResult<()>;
    /// Commit the staged state, returning the new commit id.
    fn commit(&self, message: &str) -> FolioResult<String>;
    /// Push the current branch to the remote.
    fn push(&self) -> FolioResult<()>;
}

/// Name of the remote pulled from and pushed to.
const REMOTE: &str = "origin";

/// A git working copy backed by libgit2.
#[derive(Debug, Clone)]
pub struct GitReplica {
    root: PathBuf,
    remote_url: Option<String>,
    author: Option<Author>,
}

impl GitReplica {
    pub fn new(root: impl Into<PathBuf>, remote_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            remote_url,
            author: None,
        }
    }

    /// Commit as `author` instead of git's configured identity.
    pub fn with_author(mut self, author: Option<Author>) -> Self {
        self.author = author;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn clone_fresh(&self) -> FolioResult<SyncReport> {
        let url = self.remote_url.as_deref().ok_or_else(|| {
            FolioError::Config(format!(
                "{} does not exist and no remote URL is configured to clone from",
                self.root.display()
            ))
        })?;
        tracing::debug!(url, path = %self.root.display(), "cloning replica");

        let auth = GitAuthenticator::default();
        let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(auth.credentials(&config));
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);

        RepoBuilder::new()
            .fetch_options(fetch)
            .clone(url, &self.root)
            .map_err(|e| sync_error(&format!("cannot clone {url}"), e))?;
        Ok(SyncReport::Cloned)
    }

    fn pull(&self) -> FolioResult<SyncReport> {
        let repo = Repository::open(&self.root).map_err(|e| {
            sync_error(
                &format!("{} is not a git repository", self.root.display()),
                e,
            )
        })?;
        let refname = head_branch_ref(&repo).map_err(FolioError::Sync)?;
        let branch = refname.trim_start_matches("refs/heads/").to_string();
        tracing::debug!(%branch, remote = REMOTE, "fetching");

        let mut remote = repo
            .find_remote(REMOTE)
            .map_err(|e| sync_error(&format!("no remote named {REMOTE}"), e))?;
        let auth = GitAuthenticator::default();
        let config = repo.config()?;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(auth.credentials(&config));
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);
        remote
            .fetch(&[branch.as_str()], Some(&mut fetch), None)
            .map_err(|e| sync_error("fetch failed", e))?;

        let fetch_head = match repo.find_reference("FETCH_HEAD") {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(SyncReport::NoUpstream),
            Err(e) => return Err(sync_error("cannot read FETCH_HEAD", e)),
        };
        let incoming = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&incoming])?;

        if analysis.is_up_to_date() {
            return Ok(SyncReport::UpToDate);
        }
        if !(analysis.is_fast_forward() || analysis.is_unborn()) {
            return Err(FolioError::Sync(format!(
                "local branch {branch} has diverged from {REMOTE}/{branch}; resolve it with git first"
            )));
        }

        // Check out the new tree against the old HEAD first so local edits
        // to the same files fail the pull instead of being overwritten.
        let target = repo.find_commit(incoming.id())?;
        repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| sync_error("cannot update working tree", e))?;
        repo.reference(&refname, target.id(), true, "folio: fast-forward")?;
        if analysis.is_unborn() {
            repo.set_head(&refname)?;
        }
        Ok(SyncReport::FastForwarded {
            to: target.id().to_string(),
        })
    }

    fn open_for_publish(&self) -> FolioResult<Repository> {
        Repository::open(&self.root).map_err(|e| publish_error("cannot open replica", e))
    }

    fn signature(&self, repo: &Repository) -> FolioResult<Signature<'static>> {
        let sig = match &self.author {
            Some(author) => Signature::now(&author.name, &author.email),
            None => repo.signature(),
        };
        sig.map_err(|e| {
            publish_error(
                "no commit identity; set git user.name/user.email or configure an author",
                e,
            )
        })
    }
}

impl SourceControl for GitReplica {
    fn ensure_present_and_current(&self) -> FolioResult<SyncReport> {
        let report = if self.root.exists() {
            self.pull()?
        } else {
            self.clone_fresh()?
        };
        tracing::info!(path = %self.root.display(), ?report, "replica synced");
        Ok(report)
    }

    fn stage(&self, rel_path: &Path) -> FolioResult<()> {
        let repo = self.open_for_publish()?;
        let mut index = repo.index().map_err(|e| publish_error("cannot read index", e))?;
        index
            .add_path(rel_path)
            .map_err(|e| publish_error(&format!("cannot stage {}", rel_path.display()), e))?;
        index
            .write()
            .map_err(|e| publish_error("cannot write index", e))?;
        Ok(())
    }

    fn commit(&self, message: &str) -> FolioResult<String> {
        let repo = self.open_for_publish()?;
        let mut index = repo.index().map_err(|e| publish_error("cannot read index", e))?;
        let tree_id = index
            .write_tree()
            .map_err(|e| publish_error("cannot write tree", e))?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(publish_error("cannot resolve HEAD", e)),
        };
        if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            return Err(FolioError::Publish("nothing to commit".to_string()));
        }

        let sig = self.signature(&repo)?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(|e| publish_error("commit failed", e))?;
        tracing::debug!(commit = %oid, "committed");
        Ok(oid.to_string())
    }

    fn push(&self) -> FolioResult<()> {
        let repo = self.open_for_publish()?;
        let refname = head_branch_ref(&repo).map_err(FolioError::Publish)?;
        let mut remote = repo
            .find_remote(REMOTE)
            .map_err(|e| publish_error(&format!("no remote named {REMOTE}"), e))?;

        let auth = GitAuthenticator::default();
        let config = repo.config()?;
        let mut rejected = Vec::new();
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(auth.credentials(&config));
            callbacks.push_update_reference(|name, status| {
                if let Some(msg) = status {
                    rejected.push(format!("{name}: {msg}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("{refname}:{refname}");
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| publish_error("push failed", e))?;
        }

        if !rejected.is_empty() {
            return Err(FolioError::Publish(format!(
                "push rejected: {}",
                rejected.join(", ")
            )));
        }
        tracing::info!(%refname, remote = REMOTE, "pushed");
        Ok(())
    }
}

/// Full ref name of the branch HEAD points at, e.g. `refs/heads/main`.
fn head_branch_ref(repo: &Repository) -> Result<String, String> {
    let head = repo
        .find_reference("HEAD")
        .map_err(|e| format!("cannot read HEAD: {}", e.message()))?;
    match head.symbolic_target() {
        Some(target) if target.starts_with("refs/heads/") => Ok(target.to_string()),
        _ => Err("HEAD is detached; check out a branch first".to_string()),
    }
}

fn sync_error(context: &str, e: git2::Error) -> FolioError {
    FolioError::Sync(format!("{context}: {}", e.message()))
}

fn publish_error(context: &str, e: git2::Error) -> FolioError {
    FolioError::Publish(format!("{context}: {}", e.message()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = "portfolio.json";

    fn author() -> Option<Author> {
        Some(Author {
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
        })
    }

    /// Build a bare "remote" holding one commit with a portfolio file.
    fn seeded_remote(dir: &Path) -> String {
        let seed = dir.join("seed");
        let repo = Repository::init(&seed).unwrap();
        fs::write(seed.join(DOC), "{\n  \"skills\": []\n}\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(DOC)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Seed", "seed@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();

        let remote = dir.join("remote.git");
        RepoBuilder::new()
            .bare(true)
            .clone(seed.to_str().unwrap(), &remote)
            .unwrap();
        remote.to_str().unwrap().to_string()
    }

    fn replica(dir: &Path, name: &str, url: &str) -> GitReplica {
        GitReplica::new(dir.join(name), Some(url.to_string())).with_author(author())
    }

    fn publish(replica: &GitReplica, contents: &str, message: &str) -> String {
        fs::write(replica.root().join(DOC), contents).unwrap();
        replica.stage(Path::new(DOC)).unwrap();
        let id = replica.commit(message).unwrap();
        replica.push().unwrap();
        id
    }

    #[test]
    fn test_clone_then_up_to_date() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);

        assert_eq!(a.ensure_present_and_current().unwrap(), SyncReport::Cloned);
        assert!(a.root().join(DOC).exists());
        assert_eq!(a.ensure_present_and_current().unwrap(), SyncReport::UpToDate);
    }

    #[test]
    fn test_clone_without_url_is_config_error() {
        let dir = tempdir().unwrap();
        let r = GitReplica::new(dir.path().join("missing"), None);
        let err = r.ensure_present_and_current().unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn test_clone_bad_url_is_sync_error() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("nowhere.git");
        let r = replica(dir.path(), "a", bogus.to_str().unwrap());
        let err = r.ensure_present_and_current().unwrap_err();
        assert!(matches!(err, FolioError::Sync(_)));
    }

    #[test]
    fn test_existing_non_repo_is_sync_error() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("plain")).unwrap();
        let r = replica(dir.path(), "plain", "unused");
        let err = r.ensure_present_and_current().unwrap_err();
        assert!(matches!(err, FolioError::Sync(_)));
    }

    #[test]
    fn test_publish_creates_one_commit_on_remote() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);
        a.ensure_present_and_current().unwrap();

        let id = publish(&a, "{\n  \"skills\": [\"Rust\"]\n}\n", "Add new skill");

        let remote = Repository::open_bare(&url).unwrap();
        let head = remote.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.id().to_string(), id);
        assert_eq!(head.message(), Some("Add new skill"));
        assert_eq!(head.parent(0).unwrap().message(), Some("initial"));
        assert_eq!(head.author().name(), Some("Test"));
    }

    #[test]
    fn test_commit_without_changes_fails() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);
        a.ensure_present_and_current().unwrap();

        a.stage(Path::new(DOC)).unwrap();
        let err = a.commit("noop").unwrap_err();
        assert!(err.to_string().contains("nothing to commit"));
    }

    #[test]
    fn test_stage_missing_file_is_publish_error() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);
        a.ensure_present_and_current().unwrap();

        let err = a.stage(Path::new("absent.json")).unwrap_err();
        assert!(matches!(err, FolioError::Publish(_)));
    }

    #[test]
    fn test_pull_fast_forwards_other_replica() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);
        let b = replica(dir.path(), "b", &url);
        a.ensure_present_and_current().unwrap();
        b.ensure_present_and_current().unwrap();

        let contents = "{\n  \"skills\": [\"Go\"]\n}\n";
        let id = publish(&a, contents, "Add new skill");

        let report = b.ensure_present_and_current().unwrap();
        assert_eq!(report, SyncReport::FastForwarded { to: id.clone() });
        assert_eq!(fs::read_to_string(b.root().join(DOC)).unwrap(), contents);
        let repo = Repository::open(b.root()).unwrap();
        assert_eq!(repo.head().unwrap().target().unwrap().to_string(), id);
        assert!(repo.statuses(None).unwrap().is_empty());
    }

    #[test]
    fn test_diverged_history_is_not_merged() {
        let dir = tempdir().unwrap();
        let url = seeded_remote(dir.path());
        let a = replica(dir.path(), "a", &url);
        let b = replica(dir.path(), "b", &url);
        a.ensure_present_and_current().unwrap();
        b.ensure_present_and_current().unwrap();

        publish(&a, "{\"skills\": [\"A\"]}\n", "from a");
        fs::write(b.root().join(DOC), "{\"skills\": [\"B\"]}\n").unwrap();
        b.stage(Path::new(DOC)).unwrap();
        b.commit("from b").unwrap();

        let err = b.push().unwrap_err();
        assert!(matches!(err, FolioError::Publish(_)));
        let err = b.ensure_present_and_current().unwrap_err();
        assert!(err.to_string().contains("diverged"));
        assert_eq!(
            fs::read_to_string(b.root().join(DOC)).unwrap(),
            "{\"skills\": [\"B\"]}\n"
        );
    }
}
