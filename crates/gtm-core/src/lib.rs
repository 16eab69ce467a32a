//! Core engine for git time metrics.
//!
//! This crate contains the fundamental types and logic for:
//! - Epochs: quantizing activity timestamps into fixed-length buckets
//! - Recording: turning one file or terminal event into an epoch marker
//! - Aggregation: converting pending markers into per-file seconds
//! - Commit records: additively merging new time into per-commit notes
//!
//! Storage, git plumbing, and project discovery are reached through the
//! traits in [`store`].

mod aggregate;
pub mod commit;
pub mod epoch;
mod record;
pub mod recorder;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use aggregate::{PendingAllocation, TimeSpan, aggregate};
pub use commit::{CommitError, CommitOutcome, commit_pending, merge_into_commit, pending_allocation};
pub use epoch::{Clock, Epoch, EpochMarker, FixedClock, Subject, SystemClock};
pub use record::{CommitTimeRecord, RECORD_VERSION};
pub use recorder::{RecordError, RecordTarget, Recorded, ResolvedSubject, record_marker, resolve_target};
pub use store::{EpochStore, NoteStore, ProjectResolver};
pub use types::{CommitId, EpochLength, FilePath, ValidationError};
