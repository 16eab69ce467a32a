//! Status command for showing time recorded but not yet committed.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use gtm_core::{CommitTimeRecord, pending_allocation};

use super::report::format_record;
use super::util::{Project, format_duration};

/// Runs the status command. Never consumes pending markers.
pub fn run<W: Write>(
    writer: &mut W,
    cwd: &Path,
    config_path: Option<&Path>,
    total_only: bool,
    json: bool,
) -> Result<()> {
    let project = Project::require(cwd, config_path)?;
    let db = project.open_db()?;
    let pending = pending_allocation(&db, project.config.epoch_seconds)
        .context("failed to aggregate pending time")?;
    let record = CommitTimeRecord::from(&pending);

    if total_only {
        writeln!(writer, "{}", format_duration(record.total_secs))?;
    } else if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&record)?)?;
    } else if pending.is_empty() {
        writeln!(writer, "No pending time.")?;
    } else {
        writeln!(writer, "Pending time")?;
        write!(writer, "{}", format_record(&record))?;
    }
    Ok(())
}
