//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::epoch::EpochMarker;
use crate::record::CommitTimeRecord;
use crate::store::{EpochStore, NoteStore, ProjectResolver};
use crate::types::CommitId;

fn injected() -> io::Error {
    io::Error::other("injected failure")
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub markers: BTreeSet<EpochMarker>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            markers: BTreeSet::new(),
            fail: true,
        }
    }
}

impl EpochStore for MemoryStore {
    type Error = io::Error;

    fn insert(&mut self, marker: &EpochMarker) -> Result<bool, Self::Error> {
        if self.fail {
            return Err(injected());
        }
        Ok(self.markers.insert(marker.clone()))
    }

    fn snapshot(&self) -> Result<Vec<EpochMarker>, Self::Error> {
        if self.fail {
            return Err(injected());
        }
        Ok(self.markers.iter().cloned().collect())
    }

    fn remove(&mut self, markers: &[EpochMarker]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(injected());
        }
        Ok(markers.iter().filter(|m| self.markers.remove(*m)).count())
    }
}

#[derive(Debug, Default)]
pub struct MemoryNotes {
    pub notes: RefCell<BTreeMap<CommitId, CommitTimeRecord>>,
    pub fail_writes: Cell<bool>,
}

impl NoteStore for MemoryNotes {
    type Error = io::Error;

    fn read_note(&self, commit: &CommitId) -> Result<Option<CommitTimeRecord>, Self::Error> {
        Ok(self.notes.borrow().get(commit).cloned())
    }

    fn write_note(&self, commit: &CommitId, record: &CommitTimeRecord) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(injected());
        }
        self.notes.borrow_mut().insert(commit.clone(), record.clone());
        Ok(())
    }
}

/// Treats any ancestor directory containing `.gtm/` as a project root.
#[derive(Debug, Default)]
pub struct DirResolver;

impl ProjectResolver for DirResolver {
    type Error = io::Error;

    fn root_for(&self, path: &Path) -> Result<Option<PathBuf>, Self::Error> {
        Ok(path
            .ancestors()
            .find(|dir| dir.join(".gtm").is_dir())
            .map(Path::to_path_buf))
    }
}
