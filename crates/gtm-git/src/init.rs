//! Project initialization.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;

use crate::{DATA_DIR, GitError};

/// Line added to the `post-commit` hook.
pub const HOOK_COMMAND: &str = "gtm commit";

const HOOK_NAME: &str = "post-commit";

/// What [`init_project`] set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub hook_path: PathBuf,
    /// False when the hook already ran `gtm commit`.
    pub hook_installed: bool,
}

/// Prepares the working tree of `repo` for tracking.
///
/// Creates the data directory, configures git to carry notes under
/// `notes_ref` across amend and rebase, and installs the post-commit hook.
/// Safe to run repeatedly.
pub fn init_project(repo: &Repository, notes_ref: &str) -> Result<InitReport, GitError> {
    let root = repo
        .workdir()
        .ok_or_else(|| GitError::Bare {
            path: repo.path().to_path_buf(),
        })?
        .to_path_buf();

    let data_dir = root.join(DATA_DIR);
    fs::create_dir_all(&data_dir).map_err(|source| GitError::Io {
        path: data_dir.clone(),
        source,
    })?;
    let ignore = data_dir.join(".gitignore");
    write_file(&ignore, "*\n")?;

    let mut config = repo.config()?;
    config.set_str("notes.rewriteRef", notes_ref)?;
    config.set_bool("notes.rewrite.amend", true)?;
    config.set_bool("notes.rewrite.rebase", true)?;

    let hook_path = hooks_dir(repo, &root)?.join(HOOK_NAME);
    let hook_installed = install_hook(&hook_path)?;
    tracing::debug!(
        root = %root.display(),
        hook = %hook_path.display(),
        hook_installed,
        "initialized project"
    );

    Ok(InitReport {
        root,
        data_dir,
        hook_path,
        hook_installed,
    })
}

/// Honors `core.hooksPath`, falling back to the common git dir's `hooks/`.
fn hooks_dir(repo: &Repository, root: &Path) -> Result<PathBuf, GitError> {
    let configured = repo.config()?.get_path("core.hooksPath").ok();
    Ok(match configured {
        Some(path) if path.is_absolute() => path,
        Some(path) => root.join(path),
        None => common_dir(repo)?.join("hooks"),
    })
}

/// The git dir shared by all worktrees of `repo`.
///
/// A linked worktree's private git dir names the shared one in its
/// `commondir` file, relative to itself.
fn common_dir(repo: &Repository) -> Result<PathBuf, GitError> {
    let git_dir = repo.path();
    let pointer = git_dir.join("commondir");
    match fs::read_to_string(&pointer) {
        Ok(content) => Ok(git_dir.join(content.trim())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(git_dir.to_path_buf()),
        Err(source) => Err(GitError::Io {
            path: pointer,
            source,
        }),
    }
}

/// Appends the hook command unless it is already present.
fn install_hook(path: &Path) -> Result<bool, GitError> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(GitError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let content = match existing {
        Some(content) if content.lines().any(|l| l.trim() == HOOK_COMMAND) => return Ok(false),
        Some(mut content) => {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(HOOK_COMMAND);
            content.push('\n');
            content
        }
        None => format!("#!/bin/sh\n{HOOK_COMMAND}\n"),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GitError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_file(path, &content)?;
    make_executable(path)?;
    Ok(true)
}

fn write_file(path: &Path, content: &str) -> Result<(), GitError> {
    fs::write(path, content).map_err(|source| GitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), GitError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| GitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), GitError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::repo_with_commit;
    use crate::{DEFAULT_NOTES_REF, GitResolver};
    use gtm_core::ProjectResolver;

    #[test]
    fn init_creates_data_dir_and_hook() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());

        let report = init_project(&repo, DEFAULT_NOTES_REF).unwrap();

        assert!(report.data_dir.is_dir());
        assert!(report.hook_installed);
        let hook = fs::read_to_string(&report.hook_path).unwrap();
        assert_eq!(hook, "#!/bin/sh\ngtm commit\n");
        assert!(GitResolver.root_for(dir.path()).unwrap().is_some());
    }

    #[test]
    fn init_configures_note_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        init_project(&repo, DEFAULT_NOTES_REF).unwrap();

        let config = repo.config().unwrap();
        assert_eq!(
            config.get_string("notes.rewriteRef").unwrap(),
            DEFAULT_NOTES_REF
        );
        assert!(config.get_bool("notes.rewrite.amend").unwrap());
        assert!(config.get_bool("notes.rewrite.rebase").unwrap());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());

        init_project(&repo, DEFAULT_NOTES_REF).unwrap();
        let second = init_project(&repo, DEFAULT_NOTES_REF).unwrap();

        assert!(!second.hook_installed);
        let hook = fs::read_to_string(&second.hook_path).unwrap();
        assert_eq!(hook.matches(HOOK_COMMAND).count(), 1);
    }

    #[test]
    fn hook_in_linked_worktree_goes_to_shared_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        let other = tempfile::tempdir().unwrap();
        let worktree = repo
            .worktree("feature", &other.path().join("feature"), None)
            .unwrap();
        let linked = Repository::open_from_worktree(&worktree).unwrap();

        let report = init_project(&linked, DEFAULT_NOTES_REF).unwrap();

        assert!(report.hook_installed);
        assert!(repo.path().join("hooks").join(HOOK_NAME).is_file());
        assert!(!linked.path().join("hooks").join(HOOK_NAME).exists());
    }

    #[test]
    fn relative_hooks_path_resolves_against_work_tree() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        repo.config()
            .unwrap()
            .set_str("core.hooksPath", ".githooks")
            .unwrap();

        let report = init_project(&repo, DEFAULT_NOTES_REF).unwrap();

        assert!(dir.path().join(".githooks").join(HOOK_NAME).is_file());
        assert!(report.hook_path.ends_with(".githooks/post-commit"));
    }

    #[test]
    fn init_appends_to_existing_hook() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        let hook_path = repo.path().join("hooks").join("post-commit");
        fs::create_dir_all(hook_path.parent().unwrap()).unwrap();
        fs::write(&hook_path, "#!/bin/sh\necho done").unwrap();

        init_project(&repo, DEFAULT_NOTES_REF).unwrap();

        let hook = fs::read_to_string(&hook_path).unwrap();
        assert_eq!(hook, "#!/bin/sh\necho done\ngtm commit\n");
    }
}
