//! Attributing pending activity to a commit.
//!
//! A commit cycle is snapshot → aggregate → merge → persist → remove. The
//! note is always written before markers are removed. A crash between the
//! two leaves the markers in place, and the next cycle merges them again:
//! time may be counted twice, but never lost.

use thiserror::Error;

use crate::aggregate::{PendingAllocation, aggregate};
use crate::record::CommitTimeRecord;
use crate::store::{EpochStore, NoteStore};
use crate::types::{CommitId, EpochLength};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from aggregating or persisting commit time.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Reading or removing epoch markers failed.
    #[error("epoch store failed")]
    Store(#[source] BoxError),

    /// Reading the existing note for the commit failed.
    #[error("failed to read time note for {commit}")]
    ReadNote {
        commit: CommitId,
        #[source]
        source: BoxError,
    },

    /// Writing the merged note failed. Markers were left untouched.
    #[error("failed to write time note for {commit}")]
    WriteNote {
        commit: CommitId,
        #[source]
        source: BoxError,
    },
}

/// What a commit cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No pending activity; nothing was written or removed.
    NothingPending {
        existing: Option<CommitTimeRecord>,
    },
    /// Pending activity was merged into the commit's record.
    Merged {
        added: PendingAllocation,
        record: CommitTimeRecord,
        removed: usize,
    },
}

/// Aggregates everything currently pending, without consuming it.
pub fn pending_allocation<S: EpochStore>(
    store: &S,
    len: EpochLength,
) -> Result<PendingAllocation, CommitError> {
    let snapshot = store
        .snapshot()
        .map_err(|e| CommitError::Store(Box::new(e)))?;
    Ok(aggregate(&snapshot, len))
}

/// Merges `pending` into the record for `commit`, persists it, then removes
/// exactly the markers `pending` was computed from.
pub fn merge_into_commit<S: EpochStore, N: NoteStore>(
    store: &mut S,
    notes: &N,
    commit: &CommitId,
    pending: &PendingAllocation,
) -> Result<(CommitTimeRecord, usize), CommitError> {
    let existing = notes
        .read_note(commit)
        .map_err(|e| CommitError::ReadNote {
            commit: commit.clone(),
            source: Box::new(e),
        })?;
    if existing.is_some() {
        tracing::debug!(%commit, "merging into existing time note");
    }

    let record = CommitTimeRecord::merge(existing, pending);
    notes
        .write_note(commit, &record)
        .map_err(|e| CommitError::WriteNote {
            commit: commit.clone(),
            source: Box::new(e),
        })?;

    let removed = store
        .remove(&pending.consumed)
        .map_err(|e| CommitError::Store(Box::new(e)))?;
    if removed != pending.consumed.len() {
        tracing::warn!(
            expected = pending.consumed.len(),
            removed,
            "some consumed markers were already gone"
        );
    }
    Ok((record, removed))
}

/// Runs one full commit cycle for `commit`.
pub fn commit_pending<S: EpochStore, N: NoteStore>(
    store: &mut S,
    notes: &N,
    commit: &CommitId,
    len: EpochLength,
) -> Result<CommitOutcome, CommitError> {
    let pending = pending_allocation(&*store, len)?;
    if pending.is_empty() {
        let existing = notes
            .read_note(commit)
            .map_err(|e| CommitError::ReadNote {
                commit: commit.clone(),
                source: Box::new(e),
            })?;
        tracing::debug!(%commit, "no pending activity");
        return Ok(CommitOutcome::NothingPending { existing });
    }

    let (record, removed) = merge_into_commit(store, notes, commit, &pending)?;
    tracing::debug!(
        %commit,
        added_secs = pending.total_secs,
        total_secs = record.total_secs,
        removed,
        "recorded commit time"
    );
    Ok(CommitOutcome::Merged {
        added: pending,
        record,
        removed,
    })
}
