//! Job-view ledger — append-only records guaranteeing at-most-one view
//! per (user, job) and per (email, job) pair.
//!
//! Rows are never updated or deleted; the unique indexes are the
//! authoritative dedup mechanism (client-side state is advisory only).

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A single row in the view ledger.
#[derive(Debug, Clone)]
pub struct ViewRecord {
    pub user_id: String,
    pub job_id: String,
    pub user_email: String,
    pub viewed_at: DateTime<Utc>,
}

impl ViewRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let viewed_at: String = row.get("viewed_at")?;
        Ok(Self {
            user_id: row.get("user_id")?,
            job_id: row.get("job_id")?,
            user_email: row.get("user_email")?,
            viewed_at: DateTime::parse_from_rfc3339(&viewed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

/// Inserts a view record. A second insert for the same (user_id, job_id)
/// or (user_email, job_id) pair fails with [`DatabaseError::Duplicate`];
/// the service layer translates that into an idempotent no-op.
pub fn record_view(
    db: &Database,
    user_id: &str,
    job_id: &str,
    user_email: &str,
    viewed_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_views (user_id, job_id, user_email, viewed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, job_id, user_email, viewed_at.to_rfc3339()],
        )
        .map_err(DatabaseError::from_insert)?;
        Ok(())
    })
}

/// Counts ledger rows for a job — the job's view total.
pub fn count_views(db: &Database, job_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM job_views WHERE job_id = ?1",
            params![job_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Time-ordered scan for analytics: views since `since`, newest first.
pub fn recent_views(db: &Database, since: DateTime<Utc>) -> Result<Vec<ViewRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM job_views WHERE viewed_at >= ?1 ORDER BY viewed_at DESC",
        )?;
        let rows: Vec<ViewRecord> = stmt
            .query_map(params![since.to_rfc3339()], ViewRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
