//! Epoch marker storage for gtm using `rusqlite`.
//!
//! One database lives in each project at `.gtm/epochs.db`. Every `gtm`
//! invocation is a short-lived process, so the database is the only point
//! of coordination between concurrent recorders and commit hooks.
//!
//! # Concurrency
//!
//! - Inserts use `INSERT OR IGNORE` against the primary key, so two processes
//!   recording the same marker leave exactly one row.
//! - Snapshots are a single `SELECT`, which SQLite runs against one
//!   consistent read view.
//! - Removal deletes an explicit key set inside one `IMMEDIATE` transaction.
//!   Rows inserted after the snapshot are never matched.
//! - Lock contention is absorbed by `busy_timeout`; the WAL journal lets
//!   readers proceed alongside a writer.
//!
//! # Schema
//!
//! `kind` is `file` or `terminal`; `path` is the root-relative file path, or
//! the empty string for the terminal. `recorded_at` is the ISO 8601 time the
//! marker was first written and is informational only.

use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use gtm_core::{Epoch, EpochMarker, EpochStore, FilePath, Subject};
use rusqlite::{Connection, TransactionBehavior, params};
use thiserror::Error;

/// File name of the marker database inside the project's `.gtm` directory.
pub const DB_FILE_NAME: &str = "epochs.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const KIND_FILE: &str = "file";
const KIND_TERMINAL: &str = "terminal";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row could not be turned back into a marker.
    #[error("invalid epoch marker row: kind={kind}, path={path:?}")]
    InvalidMarker { kind: String, path: String },
}

/// Epoch marker database.
///
/// Wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
pub struct EpochDb {
    conn: Connection,
}

impl EpochDb {
    /// Opens the database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), %mode, "opened epoch database");
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens the database for the project rooted at `root`.
    pub fn open_in_project(root: &Path) -> Result<Self, DbError> {
        Self::open(&root.join(".gtm").join(DB_FILE_NAME))
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS epoch_markers (
                kind TEXT NOT NULL,
                path TEXT NOT NULL DEFAULT '',
                epoch INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (kind, path, epoch)
            ) WITHOUT ROWID;

            CREATE INDEX IF NOT EXISTS idx_epoch_markers_epoch ON epoch_markers(epoch);
            ",
        )?;
        Ok(())
    }

    /// Number of unconsumed markers.
    pub fn count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM epoch_markers", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn subject_key(subject: &Subject) -> (&'static str, &str) {
    match subject {
        Subject::File(path) => (KIND_FILE, path.as_str()),
        Subject::Terminal => (KIND_TERMINAL, ""),
    }
}

fn subject_from_row(kind: String, path: String) -> Result<Subject, DbError> {
    match kind.as_str() {
        KIND_TERMINAL => Ok(Subject::Terminal),
        KIND_FILE => FilePath::new(path.clone())
            .map(Subject::File)
            .map_err(|_| DbError::InvalidMarker { kind, path }),
        _ => Err(DbError::InvalidMarker { kind, path }),
    }
}

impl EpochStore for EpochDb {
    type Error = DbError;

    fn insert(&mut self, marker: &EpochMarker) -> Result<bool, DbError> {
        let (kind, path) = subject_key(&marker.subject);
        let recorded_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO epoch_markers (kind, path, epoch, recorded_at) VALUES (?, ?, ?, ?)",
            params![kind, path, marker.epoch.index(), recorded_at],
        )?;
        Ok(inserted > 0)
    }

    fn snapshot(&self) -> Result<Vec<EpochMarker>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT kind, path, epoch
            FROM epoch_markers
            ORDER BY epoch ASC, kind ASC, path ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(0)?;
            let path: String = row.get(1)?;
            let epoch: i64 = row.get(2)?;
            Ok((kind, path, epoch))
        })?;
        let mut markers = Vec::new();
        for row in rows {
            let (kind, path, epoch) = row?;
            let subject = subject_from_row(kind, path)?;
            markers.push(EpochMarker::new(subject, Epoch::new(epoch)));
        }
        Ok(markers)
    }

    fn remove(&mut self, markers: &[EpochMarker]) -> Result<usize, DbError> {
        if markers.is_empty() {
            return Ok(0);
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt =
                tx.prepare("DELETE FROM epoch_markers WHERE kind = ? AND path = ? AND epoch = ?")?;
            for marker in markers {
                let (kind, path) = subject_key(&marker.subject);
                removed += stmt.execute(params![kind, path, marker.epoch.index()])?;
            }
        }
        tx.commit()?;
        tracing::debug!(removed, "removed consumed epoch markers");
        Ok(removed)
    }
}
