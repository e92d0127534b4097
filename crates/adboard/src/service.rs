//! Store-backed delivery service.
//!
//! Wraps the database with the failure semantics the surfaces rely on:
//! duplicate ledger inserts are idempotent successes, tracking failures
//! are logged and swallowed, and view recording gets one retry before it
//! degrades to a soft error. Nothing in here may block page rendering.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::db::{ad_repo, impression_repo, view_repo, Database, DatabaseError};
use crate::db::view_repo::ViewRecord;
use crate::error::{FetchError, TrackingError};
use crate::model::{Advertisement, Placement};

/// Source of ads and sink for tracking events. Implemented by
/// [`AdService`] (local store) and [`crate::api::ApiClient`] (remote),
/// so the popup controller is storage-agnostic.
pub trait AdProvider: Send + Sync {
    fn fetch_ads(
        &self,
        placement: Placement,
    ) -> impl Future<Output = Result<Vec<Advertisement>, FetchError>> + Send;

    fn track_click(&self, ad_id: &str) -> impl Future<Output = Result<(), TrackingError>> + Send;

    fn track_impression(
        &self,
        ad_id: &str,
    ) -> impl Future<Output = Result<(), TrackingError>> + Send;
}

/// Delivery service over the local database. One instance per client
/// session; the session id keys impression dedup.
#[derive(Clone)]
pub struct AdService {
    db: Database,
    session_id: String,
}

impl AdService {
    pub fn new(db: Database, session_id: impl Into<String>) -> Self {
        Self {
            db,
            session_id: session_id.into(),
        }
    }

    /// Active ads for a placement, featured first then newest.
    pub fn list_active(&self, placement: Placement) -> Result<Vec<Advertisement>, DatabaseError> {
        ad_repo::list_active(&self.db, placement)
    }

    /// Records a job view. Returns `Ok(true)` when a new ledger row was
    /// written, `Ok(false)` when the view was already counted (for either
    /// the (user, job) or (email, job) pair). Any other persistence
    /// failure is retried once, then surfaced as a soft error — the view
    /// count is best-effort and must never block the page.
    pub fn record_view(
        &self,
        user_id: &str,
        job_id: &str,
        user_email: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackingError> {
        match view_repo::record_view(&self.db, user_id, job_id, user_email, now) {
            Ok(()) => Ok(true),
            Err(DatabaseError::Duplicate) => Ok(false),
            Err(first) => {
                log::warn!("record_view failed, retrying once: {}", first);
                match view_repo::record_view(&self.db, user_id, job_id, user_email, now) {
                    Ok(()) => Ok(true),
                    Err(DatabaseError::Duplicate) => Ok(false),
                    Err(second) => Err(TrackingError::Storage(second)),
                }
            }
        }
    }

    pub fn count_views(&self, job_id: &str) -> Result<u64, DatabaseError> {
        view_repo::count_views(&self.db, job_id)
    }

    pub fn recent_views(&self, since: DateTime<Utc>) -> Result<Vec<ViewRecord>, DatabaseError> {
        view_repo::recent_views(&self.db, since)
    }

    /// Increments the click counter. Missing or inactive ads are silent
    /// no-ops; storage failures are logged and swallowed — tracking must
    /// never interrupt navigation.
    pub fn record_click(&self, ad_id: &str) {
        match ad_repo::increment_click(&self.db, ad_id) {
            Ok(true) => {}
            Ok(false) => log::debug!("Click on unknown or inactive ad {} ignored", ad_id),
            Err(e) => log::warn!("Click tracking failed for ad {}: {}", ad_id, e),
        }
    }

    /// Records an impression, deduplicated per (ad, session, hour).
    /// Same swallow-and-log semantics as [`record_click`](Self::record_click).
    pub fn record_impression(&self, ad_id: &str, now: DateTime<Utc>) {
        match impression_repo::record_impression(&self.db, ad_id, &self.session_id, now) {
            Ok(true) => {}
            Ok(false) => log::debug!(
                "Impression for ad {} already counted this hour for session {}",
                ad_id,
                self.session_id
            ),
            Err(e) => log::warn!("Impression tracking failed for ad {}: {}", ad_id, e),
        }
    }
}

impl AdProvider for AdService {
    async fn fetch_ads(&self, placement: Placement) -> Result<Vec<Advertisement>, FetchError> {
        Ok(self.list_active(placement)?)
    }

    async fn track_click(&self, ad_id: &str) -> Result<(), TrackingError> {
        self.record_click(ad_id);
        Ok(())
    }

    async fn track_impression(&self, ad_id: &str) -> Result<(), TrackingError> {
        self.record_impression(ad_id, Utc::now());
        Ok(())
    }
}
