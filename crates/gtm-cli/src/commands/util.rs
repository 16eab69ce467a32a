//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gtm_core::ProjectResolver;
use gtm_git::GitResolver;

use crate::Config;

/// An initialized project and its configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Loads configuration for the project rooted at `root`.
    pub fn load(root: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let config =
            Config::load_from(Some(&root), config_path).context("failed to load configuration")?;
        tracing::debug!(?config, root = %root.display(), "loaded configuration");
        Ok(Self { root, config })
    }

    /// Finds the initialized project containing `cwd`.
    pub fn require(cwd: &Path, config_path: Option<&Path>) -> Result<Self> {
        let root = GitResolver
            .root_for(cwd)
            .context("failed to locate project")?
            .with_context(|| {
                format!(
                    "{} is not in an initialized project. Run 'gtm init' first.",
                    cwd.display()
                )
            })?;
        Self::load(root, config_path)
    }

    /// Opens the project's epoch marker database.
    pub fn open_db(&self) -> Result<gtm_db::EpochDb> {
        gtm_db::EpochDb::open_in_project(&self.root).context("failed to open epoch database")
    }
}

/// Formats seconds as "Xh Ym Zs", dropping leading zero units.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes:>2}m {seconds:>2}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:>2}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(3600), "1h  0m  0s");
        assert_eq!(format_duration(9_045), "2h 30m 45s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(120), "2m  0s");
        assert_eq!(format_duration(754), "12m 34s");
    }

    #[test]
    fn test_format_duration_seconds_only() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
    }
}
