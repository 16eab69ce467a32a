//! Git plumbing for gtm.
//!
//! - [`GitResolver`]: finds the initialized project containing a path
//! - [`GitNotes`]: stores [`CommitTimeRecord`]s as JSON git notes
//! - [`init_project`]: prepares a working tree for tracking
//!
//! A project is a git working tree whose root contains a `.gtm/` directory.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Oid, Repository, Signature};
use gtm_core::{CommitId, CommitTimeRecord, NoteStore, ProjectResolver, ValidationError};
use thiserror::Error;

mod init;

pub use init::{HOOK_COMMAND, InitReport, init_project};

/// Default notes ref holding time records.
pub const DEFAULT_NOTES_REF: &str = "refs/notes/gtm-data";

/// Name of the per-project data directory.
pub const DATA_DIR: &str = ".gtm";

/// Git errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// An error from libgit2.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// A filesystem operation failed.
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The repository has no working tree.
    #[error("repository at {} has no working tree", path.display())]
    Bare { path: PathBuf },

    /// An existing note could not be parsed.
    #[error("invalid time note on {commit}")]
    InvalidNote {
        commit: CommitId,
        #[source]
        source: serde_json::Error,
    },

    /// A commit id was malformed.
    #[error("invalid commit id")]
    InvalidCommit(#[from] ValidationError),
}

/// Resolves project roots by git discovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitResolver;

impl ProjectResolver for GitResolver {
    type Error = GitError;

    fn root_for(&self, path: &Path) -> Result<Option<PathBuf>, GitError> {
        let start = if path.is_dir() {
            path
        } else {
            match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            }
        };
        let repo = match Repository::discover(start) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!(path = %path.display(), "not inside a git repository");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(workdir) = repo.workdir() else {
            return Ok(None);
        };
        if workdir.join(DATA_DIR).is_dir() {
            Ok(Some(workdir.to_path_buf()))
        } else {
            tracing::debug!(root = %workdir.display(), "git repository is not initialized for gtm");
            Ok(None)
        }
    }
}

/// Opens the repository whose working tree contains `path`.
pub fn discover(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::discover(path)?;
    if repo.workdir().is_none() {
        return Err(GitError::Bare {
            path: repo.path().to_path_buf(),
        });
    }
    Ok(repo)
}

/// Resolves a revision such as `HEAD` or `main~2` to a commit id.
pub fn resolve_commit(repo: &Repository, rev: &str) -> Result<CommitId, GitError> {
    let commit = repo.revparse_single(rev)?.peel_to_commit()?;
    Ok(CommitId::new(commit.id().to_string())?)
}

/// Time records stored as git notes.
pub struct GitNotes {
    repo: Repository,
    notes_ref: String,
}

impl GitNotes {
    pub fn new(repo: Repository, notes_ref: impl Into<String>) -> Self {
        Self {
            repo,
            notes_ref: notes_ref.into(),
        }
    }

    /// The wrapped repository.
    pub const fn repo(&self) -> &Repository {
        &self.repo
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now("gtm", "gtm@localhost")?),
        }
    }
}

fn oid(commit: &CommitId) -> Result<Oid, GitError> {
    Ok(Oid::from_str(commit.as_str())?)
}

impl NoteStore for GitNotes {
    type Error = GitError;

    fn read_note(&self, commit: &CommitId) -> Result<Option<CommitTimeRecord>, GitError> {
        let note = match self.repo.find_note(Some(self.notes_ref.as_str()), oid(commit)?) {
            Ok(note) => note,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let message = note.message().unwrap_or_default();

        // Rewriting a commit after the post-commit hook already wrote to it
        // leaves one JSON document per source note in the body.
        let mut documents = 0_usize;
        let record = serde_json::Deserializer::from_str(message)
            .into_iter::<CommitTimeRecord>()
            .try_fold(None, |combined: Option<CommitTimeRecord>, record| {
                let record = record.map_err(|source| GitError::InvalidNote {
                    commit: commit.clone(),
                    source,
                })?;
                documents += 1;
                Ok::<_, GitError>(Some(match combined {
                    Some(combined) => combined.combine(record),
                    None => record,
                }))
            })?;
        if documents > 1 {
            tracing::debug!(%commit, documents, "combined concatenated time note");
        }
        Ok(record)
    }

    fn write_note(&self, commit: &CommitId, record: &CommitTimeRecord) -> Result<(), GitError> {
        let body = serde_json::to_string_pretty(record).map_err(|source| GitError::InvalidNote {
            commit: commit.clone(),
            source,
        })?;
        let sig = self.signature()?;
        self.repo
            .note(&sig, &sig, Some(self.notes_ref.as_str()), oid(commit)?, &body, true)?;
        tracing::debug!(%commit, notes_ref = %self.notes_ref, "wrote time note");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use git2::Repository;

    /// Creates a repository with a configured identity and one empty commit.
    pub fn repo_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        commit(&repo, "initial");
        repo
    }

    /// Commits the current (empty) index on HEAD.
    pub fn commit(repo: &Repository, message: &str) -> git2::Oid {
        let sig = repo.signature().unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }
}
