//! SQLite handle shared by every entity module.
//!
//! Opening a [`Database`] applies pending migrations before returning, so
//! callers never see an old schema.
//!
//! Several handles may point at the same file; WAL mode plus a busy timeout
//! lets their writes queue instead of failing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DB_FILE: &str = "cupid.db";

/// One SQLite connection with the Cupid schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open `cupid.db` in the per-user data directory, e.g.
    /// `~/.local/share/cupid/` on Linux or
    /// `~/Library/Application Support/app.cupid.cupid/` on macOS.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("app", "cupid", "cupid").ok_or(StoreError::NoDataDir)?;
        let db_path = dirs.data_dir().join(DB_FILE);
        tracing::info!(path = %db_path.display(), "opening default database");
        Self::open_at(&db_path)
    }

    /// Open `path`, creating the file and its parent directory if needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this handle; `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

/// Fixed-width UTC timestamp, so text ordering equals time ordering.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Map "no rows" to [`StoreError::NotFound`].
pub(crate) fn not_found(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Fresh database in a temporary directory. Keep the `TempDir` alive for
/// as long as the handle is used.
#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("cupid.db")).expect("open test db");
    (dir, db)
}
