//! Recording single activity observations as epoch markers.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::epoch::{Clock, Epoch, EpochMarker, Subject};
use crate::store::{EpochStore, ProjectResolver};
use crate::types::{EpochLength, FilePath};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from recording an event.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The location is not inside an initialized project.
    #[error("no initialized project for {}", path.display())]
    NotInitialized { path: PathBuf },

    /// The file to record does not exist (it may have been deleted since).
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Checking the subject path on disk failed.
    #[error("failed to inspect {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The project resolver failed.
    #[error("failed to resolve project root")]
    Resolver(#[source] BoxError),

    /// The epoch store failed.
    #[error("failed to write epoch marker")]
    Store(#[source] BoxError),
}

impl RecordError {
    /// Benign outcomes mean "nothing to do here" and are not failures.
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NotInitialized { .. } | Self::FileNotFound { .. })
    }
}

/// What the caller asked to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTarget {
    /// A file that was saved or touched.
    File(PathBuf),
    /// Terminal activity in the project containing `cwd`.
    Terminal { cwd: PathBuf },
}

/// A subject located inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubject {
    pub root: PathBuf,
    pub subject: Subject,
}

/// Outcome of a successful recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub marker: EpochMarker,
    /// False when the marker already existed.
    pub inserted: bool,
}

/// Finds the project for `target` and turns it into a subject.
///
/// File subjects become paths relative to the project root. Fails with a
/// benign error when there is no project or the file is gone.
pub fn resolve_target<R: ProjectResolver>(
    resolver: &R,
    target: &RecordTarget,
) -> Result<ResolvedSubject, RecordError> {
    match target {
        RecordTarget::Terminal { cwd } => {
            let root = find_root(resolver, cwd)?;
            Ok(ResolvedSubject {
                root,
                subject: Subject::Terminal,
            })
        }
        RecordTarget::File(path) => {
            let root = find_root(resolver, path)?;
            match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    return Err(RecordError::FileNotFound { path: path.clone() });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(RecordError::FileNotFound { path: path.clone() });
                }
                Err(source) => {
                    return Err(RecordError::Io {
                        path: path.clone(),
                        source,
                    });
                }
            }
            let file = relative_to_root(&root, path)?;
            Ok(ResolvedSubject {
                root,
                subject: Subject::File(file),
            })
        }
    }
}

/// Marks `subject` active in the current epoch.
///
/// Recording the same subject twice within one epoch leaves one marker.
pub fn record_marker<S: EpochStore, C: Clock>(
    store: &mut S,
    clock: &C,
    len: EpochLength,
    subject: Subject,
) -> Result<Recorded, RecordError> {
    let epoch = Epoch::containing(clock.now(), len);
    let marker = EpochMarker::new(subject, epoch);
    let inserted = store
        .insert(&marker)
        .map_err(|e| RecordError::Store(Box::new(e)))?;
    tracing::debug!(subject = %marker.subject, %epoch, inserted, "recorded epoch marker");
    Ok(Recorded { marker, inserted })
}

fn find_root<R: ProjectResolver>(resolver: &R, path: &Path) -> Result<PathBuf, RecordError> {
    resolver
        .root_for(path)
        .map_err(|e| RecordError::Resolver(Box::new(e)))?
        .ok_or_else(|| RecordError::NotInitialized {
            path: path.to_path_buf(),
        })
}

/// Expresses an existing file relative to `root`.
///
/// Only the parent directory is canonicalized, so a symlinked file keeps its
/// own name. Files that resolve outside the root are not part of the project.
fn relative_to_root(root: &Path, path: &Path) -> Result<FilePath, RecordError> {
    let io_err = |source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    };
    let not_in_project = || RecordError::NotInitialized {
        path: path.to_path_buf(),
    };

    let root = root.canonicalize().map_err(io_err)?;
    let name = path.file_name().ok_or_else(not_in_project)?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let absolute = parent.canonicalize().map_err(io_err)?.join(name);
    let relative = absolute.strip_prefix(&root).map_err(|_| not_in_project())?;
    FilePath::from_relative(relative).map_err(|_| not_in_project())
}
