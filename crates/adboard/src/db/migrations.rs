//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_advertisements_table",
        sql: "CREATE TABLE advertisements (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL DEFAULT '',
                media_url   TEXT NOT NULL,
                media_type  TEXT NOT NULL DEFAULT 'image',
                link        TEXT,
                position    TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1,
                featured    INTEGER NOT NULL DEFAULT 0,
                clicks      INTEGER NOT NULL DEFAULT 0,
                impressions INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
              );
              CREATE INDEX idx_ads_position_active
                ON advertisements(position, is_active);",
    },
    Migration {
        version: 2,
        description: "create_job_views_table",
        sql: "CREATE TABLE job_views (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    TEXT NOT NULL,
                job_id     TEXT NOT NULL,
                user_email TEXT NOT NULL,
                viewed_at  TEXT NOT NULL
              );
              CREATE UNIQUE INDEX idx_views_user_job
                ON job_views(user_id, job_id);
              CREATE UNIQUE INDEX idx_views_email_job
                ON job_views(user_email, job_id);
              CREATE INDEX idx_views_viewed_at
                ON job_views(viewed_at);
              CREATE INDEX idx_views_job
                ON job_views(job_id);",
    },
    Migration {
        version: 3,
        description: "create_popup_impressions_table",
        sql: "CREATE TABLE popup_impressions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                ad_id       TEXT NOT NULL,
                session_id  TEXT NOT NULL,
                hour_bucket TEXT NOT NULL,
                recorded_at TEXT NOT NULL
              );
              CREATE UNIQUE INDEX idx_impressions_dedup
                ON popup_impressions(ad_id, session_id, hour_bucket);",
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    // Create the migrations tracking table.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        conn.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}
