//! Seams to the durable collaborators the engine depends on.

use std::path::{Path, PathBuf};

use crate::epoch::EpochMarker;
use crate::record::CommitTimeRecord;
use crate::types::CommitId;

/// Durable set of epoch markers for one project.
///
/// Implementations must make [`insert`](Self::insert) atomic per marker and
/// [`remove`](Self::remove) atomic across the whole set, since independent
/// processes write to the same store.
pub trait EpochStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts a marker if absent. Returns `true` if it was newly added.
    fn insert(&mut self, marker: &EpochMarker) -> Result<bool, Self::Error>;

    /// Returns every unconsumed marker as one consistent snapshot.
    fn snapshot(&self) -> Result<Vec<EpochMarker>, Self::Error>;

    /// Removes exactly the given markers, all or nothing.
    ///
    /// Markers not in `markers` survive even if inserted after the snapshot
    /// that produced the set. Returns how many rows were removed.
    fn remove(&mut self, markers: &[EpochMarker]) -> Result<usize, Self::Error>;
}

/// Commit-scoped storage for time records.
pub trait NoteStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the record attached to `commit`, if any.
    fn read_note(&self, commit: &CommitId) -> Result<Option<CommitTimeRecord>, Self::Error>;

    /// Attaches `record` to `commit`, replacing any previous note.
    fn write_note(&self, commit: &CommitId, record: &CommitTimeRecord) -> Result<(), Self::Error>;
}

/// Maps a filesystem location to the initialized project containing it.
pub trait ProjectResolver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the project root, or `None` when `path` is not inside an
    /// initialized project.
    fn root_for(&self, path: &Path) -> Result<Option<PathBuf>, Self::Error>;
}
