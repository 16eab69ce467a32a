//! CLI subcommand implementations.

pub mod commit;
pub mod init;
pub mod record;
pub mod report;
pub mod status;
pub mod util;

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

    /// Commits the current index on HEAD.
    pub fn commit(repo: &Repository, message: &str) -> git2::Oid {
        let sig = repo.signature().unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Initializes gtm tracking with the default notes ref.
    pub fn init_project(repo: &Repository) {
        gtm_git::init_project(repo, gtm_git::DEFAULT_NOTES_REF).unwrap();
        let root = repo.workdir().unwrap();
        gtm_db::EpochDb::open_in_project(root).unwrap();
    }
}
