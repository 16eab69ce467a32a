//! Persisted per-commit time records and the additive merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{PendingAllocation, TimeSpan};
use crate::types::FilePath;

/// Current wire version of [`CommitTimeRecord`].
pub const RECORD_VERSION: u32 = 1;

/// Time recorded against one commit.
///
/// Serialized as JSON into a git note. Unknown fields are ignored and
/// missing fields default, so older and newer notes stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTimeRecord {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Total active seconds.
    #[serde(default)]
    pub total_secs: u64,

    /// Seconds where only the terminal was active.
    #[serde(default)]
    pub terminal_secs: u64,

    /// Seconds per file.
    #[serde(default)]
    pub files: BTreeMap<FilePath, u64>,

    /// Wall-clock span of the epochs summarized by this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<TimeSpan>,
}

const fn default_version() -> u32 {
    RECORD_VERSION
}

impl Default for CommitTimeRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            total_secs: 0,
            terminal_secs: 0,
            files: BTreeMap::new(),
            span: None,
        }
    }
}

impl From<&PendingAllocation> for CommitTimeRecord {
    fn from(pending: &PendingAllocation) -> Self {
        Self {
            version: RECORD_VERSION,
            total_secs: pending.total_secs,
            terminal_secs: pending.terminal_secs,
            files: pending.files.clone(),
            span: pending.span,
        }
    }
}

impl CommitTimeRecord {
    /// Merges newly observed time into an existing record.
    ///
    /// Amending a commit only ever adds work: totals and per-file seconds are
    /// summed, files on one side pass through, and spans take their hull.
    #[must_use]
    pub fn merge(existing: Option<Self>, pending: &PendingAllocation) -> Self {
        match existing {
            Some(existing) => existing.combine(Self::from(pending)),
            None => Self::from(pending),
        }
    }

    /// Adds the time of `other` into this record.
    ///
    /// Git concatenates notes when it carries them across an amend or
    /// rebase; the documents of such a note combine into one record.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        self.version = RECORD_VERSION;
        self.total_secs = self.total_secs.saturating_add(other.total_secs);
        self.terminal_secs = self.terminal_secs.saturating_add(other.terminal_secs);
        for (path, secs) in other.files {
            let entry = self.files.entry(path).or_insert(0);
            *entry = entry.saturating_add(secs);
        }
        self.span = match (self.span, other.span) {
            (Some(a), Some(b)) => Some(a.hull(b)),
            (a, b) => a.or(b),
        };
        self
    }

    /// Sum of per-file seconds.
    pub fn file_secs(&self) -> u64 {
        self.files.values().sum()
    }

    /// Files ordered by descending time, then path.
    pub fn files_by_time(&self) -> Vec<(&FilePath, u64)> {
        let mut files: Vec<_> = self.files.iter().map(|(p, s)| (p, *s)).collect();
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        files
    }
}
