//! Advertisement repository — CRUD and counter operations for the
//! `advertisements` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::model::{Advertisement, MediaType, Placement};

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

fn from_row(row: &Row<'_>) -> Result<Advertisement, rusqlite::Error> {
    let media_type: String = row.get("media_type")?;
    let position: String = row.get("position")?;
    let created_at: String = row.get("created_at")?;
    Ok(Advertisement {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        media_url: row.get("media_url")?,
        media_type: MediaType::parse(&media_type),
        link: row.get("link")?,
        position: Placement::parse(&position).unwrap_or(Placement::Homepage),
        is_active: row.get::<_, i64>("is_active")? != 0,
        featured: row.get::<_, i64>("featured")? != 0,
        clicks: row.get("clicks")?,
        impressions: row.get("impressions")?,
        created_at: parse_timestamp(&created_at),
    })
}

/// Inserts a new advertisement.
pub fn insert(db: &Database, ad: &Advertisement) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO advertisements (id, title, content, media_url, media_type, link,
             position, is_active, featured, clicks, impressions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                ad.id,
                ad.title,
                ad.content,
                ad.media_url,
                ad.media_type.as_str(),
                ad.link,
                ad.position.as_str(),
                ad.is_active as i64,
                ad.featured as i64,
                ad.clicks,
                ad.impressions,
                ad.created_at.to_rfc3339(),
            ],
        )
        .map_err(DatabaseError::from_insert)?;
        Ok(())
    })
}

/// Finds an advertisement by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Advertisement>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM advertisements WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists active advertisements for a placement, featured first, then
/// newest first. Inactive ads are excluded at the SQL level and can
/// never reach a surface.
pub fn list_active(db: &Database, placement: Placement) -> Result<Vec<Advertisement>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM advertisements
             WHERE position = ?1 AND is_active = 1
             ORDER BY featured DESC, created_at DESC",
        )?;
        let ads: Vec<Advertisement> = stmt
            .query_map(params![placement.as_str()], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ads)
    })
}

/// Atomically increments the click counter. Returns `false` when the ad
/// does not exist or is inactive (callers treat that as a no-op).
pub fn increment_click(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE advertisements SET clicks = clicks + 1
             WHERE id = ?1 AND is_active = 1",
            params![id],
        )?;
        Ok(changed > 0)
    })
}

/// Atomically increments the impression counter. Same no-op semantics as
/// [`increment_click`].
pub fn increment_impression(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE advertisements SET impressions = impressions + 1
             WHERE id = ?1 AND is_active = 1",
            params![id],
        )?;
        Ok(changed > 0)
    })
}

/// Activates or deactivates an advertisement.
pub fn set_active(db: &Database, id: &str, active: bool) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE advertisements SET is_active = ?2 WHERE id = ?1",
            params![id, active as i64],
        )?;
        Ok(changed > 0)
    })
}
