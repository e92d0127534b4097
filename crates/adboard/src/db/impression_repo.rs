//! Popup impression ledger — hour-bucketed dedup per (ad, session).
//!
//! Clicks and views already have ledger-level uniqueness; impressions
//! historically did not, so a reopened popup could double-count. This
//! table closes that gap: the first insert for an (ad, session,
//! hour-bucket) triple also bumps the ad's impression counter, in the
//! same transaction; duplicates touch nothing.

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{Database, DatabaseError};

fn hour_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H").to_string()
}

/// Records an impression. Returns `true` if this was the first impression
/// for the (ad, session) pair in the current hour bucket and the counter
/// was incremented; `false` for duplicates (no counter change).
pub fn record_impression(
    db: &Database,
    ad_id: &str,
    session_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO popup_impressions (ad_id, session_id, hour_bucket, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![ad_id, session_id, hour_bucket(at), at.to_rfc3339()],
        );
        match inserted.map_err(DatabaseError::from_insert) {
            Ok(_) => {}
            Err(DatabaseError::Duplicate) => {
                // Already counted within this hour for this session.
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        tx.execute(
            "UPDATE advertisements SET impressions = impressions + 1
             WHERE id = ?1 AND is_active = 1",
            params![ad_id],
        )?;

        tx.commit()?;
        Ok(true)
    })
}

/// Counts recorded impressions for an ad across all sessions and buckets.
pub fn count_impressions(db: &Database, ad_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM popup_impressions WHERE ad_id = ?1",
            params![ad_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
