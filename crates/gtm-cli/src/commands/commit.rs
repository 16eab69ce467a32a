//! Commit command: attributes pending time to a commit.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use gtm_core::{CommitOutcome, commit_pending};
use gtm_git::GitNotes;

use super::report::short_id;
use super::util::{Project, format_duration};

/// Runs the commit command.
pub fn run<W: Write>(
    writer: &mut W,
    cwd: &Path,
    config_path: Option<&Path>,
    rev: &str,
) -> Result<()> {
    let project = Project::require(cwd, config_path)?;
    let repo = gtm_git::discover(&project.root).context("failed to open repository")?;
    let commit = gtm_git::resolve_commit(&repo, rev)
        .with_context(|| format!("failed to resolve revision {rev}"))?;
    let mut db = project.open_db()?;
    let notes = GitNotes::new(repo, project.config.notes_ref.clone());

    let outcome = commit_pending(&mut db, &notes, &commit, project.config.epoch_seconds)
        .with_context(|| format!("failed to record time for {}", short_id(&commit)))?;

    match outcome {
        CommitOutcome::NothingPending { .. } => {
            writeln!(writer, "No pending time for {}.", short_id(&commit))?;
        }
        CommitOutcome::Merged { added, record, .. } => {
            writeln!(
                writer,
                "Recorded {} on {} (total {}).",
                format_duration(added.total_secs),
                short_id(&commit),
                format_duration(record.total_secs)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gtm_core::{
        CommitTimeRecord, Epoch, EpochMarker, EpochStore, FilePath, NoteStore, Subject,
    };

    use super::*;
    use crate::commands::test_support::{commit, init_project, repo_with_commit};

    fn insert(root: &Path, subject: &Subject, epoch: i64) {
        let mut db = gtm_db::EpochDb::open_in_project(root).unwrap();
        db.insert(&EpochMarker::new(subject.clone(), Epoch::new(epoch)))
            .unwrap();
    }

    fn note(dir: &Path, rev: &str) -> Option<CommitTimeRecord> {
        let repo = git2::Repository::open(dir).unwrap();
        let id = gtm_git::resolve_commit(&repo, rev).unwrap();
        GitNotes::new(repo, gtm_git::DEFAULT_NOTES_REF)
            .read_note(&id)
            .unwrap()
    }

    fn run_commit(dir: &Path) -> String {
        let mut output = Vec::new();
        run(&mut output, dir, None, "HEAD").unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn commit_without_pending_time_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        init_project(&repo);

        let output = run_commit(dir.path());
        assert!(output.starts_with("No pending time for "));
        assert!(note(dir.path(), "HEAD").is_none());
    }

    #[test]
    fn commit_attaches_note_and_drains_markers() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        init_project(&repo);
        let a = Subject::File(FilePath::new("a.rs").unwrap());
        let b = Subject::File(FilePath::new("b.rs").unwrap());
        insert(dir.path(), &a, 10);
        insert(dir.path(), &b, 10);
        insert(dir.path(), &a, 11);

        let output = run_commit(dir.path());
        assert!(output.starts_with("Recorded 2m  0s on "));

        let record = note(dir.path(), "HEAD").unwrap();
        assert_eq!(record.total_secs, 120);
        assert_eq!(record.files.get(&FilePath::new("a.rs").unwrap()), Some(&90));
        assert_eq!(record.files.get(&FilePath::new("b.rs").unwrap()), Some(&30));

        let db = gtm_db::EpochDb::open_in_project(dir.path()).unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn second_commit_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        init_project(&repo);
        let a = Subject::File(FilePath::new("a.rs").unwrap());

        insert(dir.path(), &a, 1);
        run_commit(dir.path());
        commit(&repo, "second");
        insert(dir.path(), &Subject::Terminal, 2);
        run_commit(dir.path());

        let first = note(dir.path(), "HEAD~1").unwrap();
        let second = note(dir.path(), "HEAD").unwrap();
        assert_eq!(first.total_secs, 60);
        assert_eq!(second.total_secs, 60);
        assert_eq!(second.terminal_secs, 60);
        assert!(second.files.is_empty());
    }

    #[test]
    fn recommitting_same_revision_adds_time() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_with_commit(dir.path());
        init_project(&repo);
        let a = Subject::File(FilePath::new("a.rs").unwrap());
        let b = Subject::File(FilePath::new("b.rs").unwrap());

        insert(dir.path(), &a, 1);
        run_commit(dir.path());
        insert(dir.path(), &b, 2);
        let output = run_commit(dir.path());

        assert!(output.contains("(total 2m  0s)"));
        let record = note(dir.path(), "HEAD").unwrap();
        assert_eq!(record.total_secs, 120);
        assert_eq!(record.files.len(), 2);
    }
}
