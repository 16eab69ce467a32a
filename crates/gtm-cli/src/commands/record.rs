//! Record command: marks a file or the terminal active in the current epoch.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use gtm_core::{Clock, RecordTarget, pending_allocation, record_marker, resolve_target};
use gtm_git::GitResolver;

use super::util::{Project, format_duration};

/// Arguments for the record command.
#[derive(Debug, Clone, Default)]
pub struct RecordArgs {
    pub terminal: bool,
    pub status: bool,
    pub file: Option<PathBuf>,
}

/// Runs the record command.
///
/// Recording outside an initialized project, or for a file that no longer
/// exists, does nothing and succeeds.
pub fn run<W: Write, C: Clock>(
    writer: &mut W,
    clock: &C,
    cwd: &Path,
    config_path: Option<&Path>,
    args: &RecordArgs,
) -> Result<()> {
    let target = if args.terminal {
        RecordTarget::Terminal {
            cwd: cwd.to_path_buf(),
        }
    } else {
        let Some(file) = &args.file else {
            bail!("Unable to record, file not provided");
        };
        RecordTarget::File(cwd.join(file))
    };

    let resolved = match resolve_target(&GitResolver, &target) {
        Ok(resolved) => resolved,
        Err(e) if e.is_benign() => {
            tracing::debug!(reason = %e, "nothing to record");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to record event"),
    };

    let project = Project::load(resolved.root, config_path)?;
    let mut db = project.open_db()?;
    let len = project.config.epoch_seconds;
    record_marker(&mut db, clock, len, resolved.subject).context("failed to record event")?;

    if args.status {
        let pending = pending_allocation(&db, len).context("failed to aggregate pending time")?;
        writeln!(writer, "{}", format_duration(pending.total_secs))?;
    }
    Ok(())
}
