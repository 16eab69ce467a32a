//! Init command for enabling time tracking in a repository.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::util::Project;

/// Runs the init command.
pub fn run<W: Write>(writer: &mut W, cwd: &Path, config_path: Option<&Path>) -> Result<()> {
    let repo = gtm_git::discover(cwd).context("gtm must be initialized inside a git working tree")?;
    let root = repo
        .workdir()
        .context("repository has no working tree")?
        .to_path_buf();
    let project = Project::load(root, config_path)?;

    let report = gtm_git::init_project(&repo, &project.config.notes_ref)
        .context("failed to initialize project")?;
    project.open_db()?;

    writeln!(writer, "Initialized: {}", report.root.display())?;
    writeln!(writer, "Notes ref:   {}", project.config.notes_ref)?;
    writeln!(writer, "Epoch:       {}", project.config.epoch_seconds)?;
    let hook_state = if report.hook_installed {
        "installed"
    } else {
        "already present"
    };
    writeln!(
        writer,
        "Hook:        {} ({hook_state})",
        report.hook_path.display()
    )?;
    Ok(())
}
