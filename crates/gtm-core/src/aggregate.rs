//! Time aggregation over a snapshot of epoch markers.
//!
//! # Algorithm Summary
//!
//! 1. Group markers by epoch index.
//! 2. Every epoch with any marker contributes one epoch length to the total.
//! 3. An epoch with file markers splits its length equally across the
//!    distinct files active in it. Leftover whole seconds go one each to the
//!    lexicographically first files, so the epoch always sums exactly.
//! 4. An epoch with only terminal markers counts toward the total and the
//!    terminal bucket, never toward a file.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::epoch::{Epoch, EpochMarker, Subject};
use crate::types::{EpochLength, FilePath};

/// Wall-clock interval covered by a set of epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Smallest span covering both.
    #[must_use]
    pub fn hull(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Result of aggregating one snapshot, not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAllocation {
    /// Seconds attributed to each file.
    pub files: BTreeMap<FilePath, u64>,

    /// Total active seconds (distinct active epochs times the epoch length).
    pub total_secs: u64,

    /// Seconds from epochs where only the terminal was active.
    pub terminal_secs: u64,

    /// Interval from the first to the end of the last active epoch.
    pub span: Option<TimeSpan>,

    /// The exact markers this allocation was computed from.
    pub consumed: Vec<EpochMarker>,
}

impl PendingAllocation {
    /// True when no activity was observed.
    pub const fn is_empty(&self) -> bool {
        self.total_secs == 0 && self.consumed.is_empty()
    }
}

/// Aggregates a marker snapshot into a pending allocation.
///
/// Pure: the same snapshot and length always produce the same allocation.
pub fn aggregate(markers: &[EpochMarker], len: EpochLength) -> PendingAllocation {
    let mut by_epoch: BTreeMap<Epoch, (BTreeSet<&FilePath>, bool)> = BTreeMap::new();
    for marker in markers {
        let (files, terminal) = by_epoch.entry(marker.epoch).or_default();
        match &marker.subject {
            Subject::File(path) => {
                files.insert(path);
            }
            Subject::Terminal => *terminal = true,
        }
    }

    // Validated positive on construction.
    let epoch_secs = len.as_secs().unsigned_abs();
    let mut files: BTreeMap<FilePath, u64> = BTreeMap::new();
    let mut terminal_secs = 0;

    for (active_files, _) in by_epoch.values() {
        if active_files.is_empty() {
            terminal_secs += epoch_secs;
            continue;
        }
        let count = active_files.len() as u64;
        let share = epoch_secs / count;
        let remainder = epoch_secs % count;
        for (i, path) in active_files.iter().enumerate() {
            let extra = u64::from((i as u64) < remainder);
            *files.entry((*path).clone()).or_insert(0) += share + extra;
        }
    }

    let span = match (by_epoch.keys().next(), by_epoch.keys().next_back()) {
        (Some(first), Some(last)) => Some(TimeSpan {
            start: first.start(len),
            end: last.end(len),
        }),
        _ => None,
    };

    let mut consumed = markers.to_vec();
    consumed.sort();
    consumed.dedup();

    PendingAllocation {
        files,
        total_secs: by_epoch.len() as u64 * epoch_secs,
        terminal_secs,
        span,
        consumed,
    }
}
