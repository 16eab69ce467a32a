//! Report command for showing the time recorded on a commit.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use gtm_core::{CommitId, CommitTimeRecord, NoteStore};
use gtm_git::GitNotes;

use super::util::{Project, format_duration};

/// Label used for terminal-only time.
pub const TERMINAL_LABEL: &str = "[terminal]";

/// Abbreviates a commit id for display.
pub fn short_id(commit: &CommitId) -> &str {
    let id = commit.as_str();
    id.get(..7).unwrap_or(id)
}

/// Formats a record as a table of durations, longest first.
pub fn format_record(record: &CommitTimeRecord) -> String {
    let mut output = String::new();
    for (path, secs) in record.files_by_time() {
        writeln!(output, "{:<12}{path}", format_duration(secs)).unwrap();
    }
    if record.terminal_secs > 0 {
        writeln!(
            output,
            "{:<12}{TERMINAL_LABEL}",
            format_duration(record.terminal_secs)
        )
        .unwrap();
    }
    writeln!(output, "{:<12}total", format_duration(record.total_secs)).unwrap();
    output
}

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    cwd: &Path,
    config_path: Option<&Path>,
    rev: &str,
    json: bool,
) -> Result<()> {
    let project = Project::require(cwd, config_path)?;
    let repo = gtm_git::discover(&project.root).context("failed to open repository")?;
    let commit = gtm_git::resolve_commit(&repo, rev)
        .with_context(|| format!("failed to resolve revision {rev}"))?;
    let notes = GitNotes::new(repo, project.config.notes_ref);
    let record = notes.read_note(&commit).context("failed to read time note")?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&record)?)?;
        return Ok(());
    }

    match record {
        Some(record) => {
            writeln!(writer, "Commit {}", short_id(&commit))?;
            write!(writer, "{}", format_record(&record))?;
        }
        None => writeln!(writer, "No time recorded for {}.", short_id(&commit))?,
    }
    Ok(())
}
