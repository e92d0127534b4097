//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// Insert violated a unique index. For the view and impression ledgers
    /// this means the event was already counted; callers translate it to an
    /// idempotent no-op at the service boundary.
    #[error("Duplicate row rejected by unique index")]
    Duplicate,

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    /// Maps a rusqlite error, folding unique-constraint violations into
    /// [`DatabaseError::Duplicate`].
    pub fn from_insert(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return DatabaseError::Duplicate;
            }
        }
        DatabaseError::Sqlite(e)
    }

    /// Returns `true` for the expected "already counted" failure.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate)
    }
}
