//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gtm_core::EpochLength;
use gtm_git::{DATA_DIR, DEFAULT_NOTES_REF};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// `epoch_seconds` must not change while a project has unconsumed markers;
/// run `gtm commit` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Length of one activity epoch, in seconds.
    pub epoch_seconds: EpochLength,

    /// Git notes ref that holds time records.
    pub notes_ref: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epoch_seconds: EpochLength::DEFAULT,
            notes_ref: DEFAULT_NOTES_REF.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration for a project.
    ///
    /// Later sources override earlier ones: defaults, the user config file,
    /// `<project>/.gtm/config.toml`, an explicit `--config` file, then `GTM_*`
    /// environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(
        project_root: Option<&Path>,
        config_path: Option<&Path>,
    ) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(root) = project_root {
            figment = figment.merge(Toml::file(root.join(DATA_DIR).join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("GTM_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for gtm.
///
/// On Linux: `~/.config/gtm`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gtm"))
}
