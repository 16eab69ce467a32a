//! Epoch quantization and the markers recorded per epoch.
//!
//! An epoch is the half-open interval `[k * L, (k + 1) * L)` seconds since
//! the Unix epoch, identified by its index `k`. Activity is only ever
//! stored at epoch granularity: a subject either was or was not active
//! during an epoch.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EpochLength, FilePath};

/// Index of an epoch for some fixed [`EpochLength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(i64);

impl Epoch {
    /// Wraps a raw epoch index.
    pub const fn new(index: i64) -> Self {
        Self(index)
    }

    /// Returns the epoch that contains `timestamp`.
    ///
    /// Uses floor division, so a timestamp exactly on a boundary belongs to
    /// the epoch that starts there.
    pub fn containing(timestamp: DateTime<Utc>, len: EpochLength) -> Self {
        Self(timestamp.timestamp().div_euclid(len.as_secs()))
    }

    /// Returns the raw index.
    pub const fn index(self) -> i64 {
        self.0
    }

    /// First instant of this epoch.
    pub fn start(self, len: EpochLength) -> DateTime<Utc> {
        Utc.timestamp_opt(self.0.saturating_mul(len.as_secs()), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// First instant after this epoch.
    pub fn end(self, len: EpochLength) -> DateTime<Utc> {
        Self(self.0.saturating_add(1)).start(len)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can be observed as active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Subject {
    /// A file in the project, relative to its root.
    File(FilePath),
    /// The terminal sentinel: active, but not editing a tracked file.
    Terminal,
}

impl Subject {
    /// Returns the file path for file subjects.
    pub const fn file(&self) -> Option<&FilePath> {
        match self {
            Self::File(path) => Some(path),
            Self::Terminal => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{path}"),
            Self::Terminal => write!(f, "[terminal]"),
        }
    }
}

/// Durable fact that `subject` had at least one event during `epoch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpochMarker {
    pub subject: Subject,
    pub epoch: Epoch,
}

impl EpochMarker {
    pub const fn new(subject: Subject, epoch: Epoch) -> Self {
        Self { subject, epoch }
    }
}

/// Source of the current time.
///
/// Passed explicitly so recording is deterministic under test.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid test timestamp")
    }

    fn len(secs: i64) -> EpochLength {
        EpochLength::from_secs(secs).unwrap()
    }

    #[test]
    fn boundary_belongs_to_the_epoch_it_starts() {
        let l = len(120);
        assert_eq!(Epoch::containing(at(240), l), Epoch::new(2));
        assert_eq!(Epoch::containing(at(239), l), Epoch::new(1));
    }

    #[test]
    fn same_epoch_iff_same_floor() {
        let l = len(60);
        for (a, b) in [(0, 59), (60, 119), (600, 659)] {
            assert_eq!(Epoch::containing(at(a), l), Epoch::containing(at(b), l));
        }
        for (a, b) in [(59, 60), (119, 120)] {
            assert_ne!(Epoch::containing(at(a), l), Epoch::containing(at(b), l));
        }
    }

    #[test]
    fn pre_unix_epoch_timestamps_floor_downward() {
        let l = len(60);
        assert_eq!(Epoch::containing(at(-1), l), Epoch::new(-1));
        assert_eq!(Epoch::containing(at(-60), l), Epoch::new(-1));
        assert_eq!(Epoch::containing(at(-61), l), Epoch::new(-2));
    }

    #[test]
    fn start_and_end_bracket_the_epoch() {
        let l = len(60);
        let epoch = Epoch::containing(at(1_000), l);
        assert_eq!(epoch.start(l), at(960));
        assert_eq!(epoch.end(l), at(1_020));
    }

    #[test]
    fn fixed_clock_returns_its_instant() {
        let clock = FixedClock(at(42));
        assert_eq!(clock.now(), at(42));
    }

    #[test]
    fn subject_display() {
        let file = Subject::File(FilePath::new("src/lib.rs").unwrap());
        assert_eq!(file.to_string(), "src/lib.rs");
        assert_eq!(Subject::Terminal.to_string(), "[terminal]");
    }
}
