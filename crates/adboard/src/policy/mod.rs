//! Session frequency-capping policy for the popup surface.
//!
//! Decides at page-load time whether the popup may be shown, based on a
//! per-partition rolling one-hour window. Authenticated users and
//! anonymous visitors are tracked under independent keys so a login does
//! not inherit the visitor's suppression state. This state is advisory
//! only — the server-side ledgers stay authoritative for counting.

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod store;

pub use store::{KeyValueStore, MemoryStore};

use crate::config::DeliveryConfig;

/// Visitor partition for suppression tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Authenticated,
    Anonymous,
}

impl Partition {
    /// Key prefix; matches the storage keys the web client has always
    /// used (`user_popup_*` / `visitor_popup_*`).
    fn prefix(&self) -> &'static str {
        match self {
            Partition::Authenticated => "user",
            Partition::Anonymous => "visitor",
        }
    }

    fn shown_key(&self) -> String {
        format!("{}_popup_shown", self.prefix())
    }

    fn timestamp_key(&self) -> String {
        format!("{}_popup_timestamp", self.prefix())
    }
}

const FRESH_LOGIN_KEY: &str = "fresh_login_timestamp";
const HAS_VISITED_KEY: &str = "has_visited_before";

/// Whether this browser has been seen before. Both kinds currently get
/// the same display delay, but the distinction is kept so differentiated
/// delays can come back without restructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    First,
    Returning,
}

/// Frequency-capping decisions over an injectable key-value store.
///
/// `session` holds the per-session suppression keys; `durable` holds the
/// cross-session "has visited before" flag.
pub struct SuppressionStore {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
    cap_window: chrono::Duration,
    fresh_login_window: chrono::Duration,
}

impl SuppressionStore {
    pub fn new(
        session: Arc<dyn KeyValueStore>,
        durable: Arc<dyn KeyValueStore>,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            session,
            durable,
            cap_window: config.cap_window(),
            fresh_login_window: config.fresh_login_window(),
        }
    }

    /// Whether the popup may be shown to this partition right now.
    ///
    /// Allowing does NOT mark the popup as shown — that happens on close
    /// via [`mark_shown`](Self::mark_shown), so an approved-but-never-
    /// displayed popup does not burn the window.
    pub fn is_allowed(&self, partition: Partition, now: DateTime<Utc>) -> bool {
        // A login completing within the last 30 seconds starts a new popup
        // session for the authenticated partition. The login timestamp is
        // consumed here so the reset applies exactly once; a show-and-close
        // inside the login window still suppresses subsequent evaluations.
        if partition == Partition::Authenticated && self.login_is_fresh(now) {
            self.session.remove(FRESH_LOGIN_KEY);
            self.clear(partition);
            return true;
        }

        if self.session.get(&partition.shown_key()).is_none() {
            return true;
        }

        match self.shown_at(partition) {
            Some(shown_at) if now - shown_at > self.cap_window => {
                // Stale flag from a previous window — clear and allow.
                self.clear(partition);
                true
            }
            Some(_) => false,
            None => {
                // Shown flag without a parseable timestamp; treat as stale.
                self.clear(partition);
                true
            }
        }
    }

    /// Records that the popup was shown and closed. Called on any close
    /// trigger (dismiss, auto-close, click-through).
    pub fn mark_shown(&self, partition: Partition, now: DateTime<Utc>) {
        self.session.set(&partition.shown_key(), "true");
        self.session.set(&partition.timestamp_key(), &now.to_rfc3339());
    }

    /// Records a completed sign-in.
    pub fn note_login(&self, now: DateTime<Utc>) {
        self.session.set(FRESH_LOGIN_KEY, &now.to_rfc3339());
    }

    /// Classifies the visit and marks the browser as seen. Idempotent
    /// after the first call.
    pub fn visit_kind(&self) -> VisitKind {
        if self.durable.get(HAS_VISITED_KEY).is_some() {
            VisitKind::Returning
        } else {
            self.durable.set(HAS_VISITED_KEY, "true");
            VisitKind::First
        }
    }

    fn login_is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.session
            .get(FRESH_LOGIN_KEY)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| now - t.with_timezone(&Utc) <= self.fresh_login_window)
            .unwrap_or(false)
    }

    fn shown_at(&self, partition: Partition) -> Option<DateTime<Utc>> {
        self.session
            .get(&partition.timestamp_key())
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    fn clear(&self, partition: Partition) {
        self.session.remove(&partition.shown_key());
        self.session.remove(&partition.timestamp_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> SuppressionStore {
        SuppressionStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            &DeliveryConfig::default(),
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_state_allows_without_marking() {
        let policy = policy();
        assert!(policy.is_allowed(Partition::Anonymous, t0()));
        // Allowing must not consume the window.
        assert!(policy.is_allowed(Partition::Anonymous, t0()));
    }

    #[test]
    fn test_mark_shown_denies_within_window() {
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, t0());

        // 59 minutes later: still suppressed.
        let now = t0() + chrono::Duration::minutes(59);
        assert!(!policy.is_allowed(Partition::Anonymous, now));
    }

    #[test]
    fn test_stale_flag_allows_and_clears() {
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, t0());

        // 61 minutes later: window has rolled over.
        let now = t0() + chrono::Duration::minutes(61);
        assert!(policy.is_allowed(Partition::Anonymous, now));
        // The stale flag was cleared, so a re-check at the original "deny"
        // offset also allows.
        assert!(policy.is_allowed(Partition::Anonymous, now));
    }

    #[test]
    fn test_partitions_are_independent() {
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, t0());

        // Logging in must not inherit the visitor's suppression.
        assert!(policy.is_allowed(Partition::Authenticated, t0()));
        assert!(!policy.is_allowed(Partition::Anonymous, t0()));
    }

    #[test]
    fn test_fresh_login_resets_authenticated_partition() {
        let policy = policy();
        policy.mark_shown(Partition::Authenticated, t0());

        let login_at = t0() + chrono::Duration::minutes(5);
        policy.note_login(login_at);

        // 10 seconds after login: suppression is reset.
        let now = login_at + chrono::Duration::seconds(10);
        assert!(policy.is_allowed(Partition::Authenticated, now));
    }

    #[test]
    fn test_fresh_login_reset_applies_only_once() {
        let policy = policy();
        policy.note_login(t0());

        // First evaluation after login consumes the reset and allows.
        assert!(policy.is_allowed(Partition::Authenticated, t0() + chrono::Duration::seconds(5)));
        policy.mark_shown(Partition::Authenticated, t0() + chrono::Duration::seconds(16));

        // A reload still inside the 30-second login window must stay
        // suppressed; the popup was already shown this hour.
        assert!(!policy.is_allowed(Partition::Authenticated, t0() + chrono::Duration::seconds(20)));
    }

    #[test]
    fn test_stale_login_does_not_reset() {
        let policy = policy();
        policy.note_login(t0());
        policy.mark_shown(Partition::Authenticated, t0() + chrono::Duration::seconds(5));

        // 31+ seconds after login the reset no longer applies.
        let now = t0() + chrono::Duration::seconds(45);
        assert!(!policy.is_allowed(Partition::Authenticated, now));
    }

    #[test]
    fn test_fresh_login_does_not_touch_anonymous() {
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, t0());
        policy.note_login(t0());

        assert!(!policy.is_allowed(Partition::Anonymous, t0() + chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_unparseable_timestamp_treated_as_stale() {
        let session = Arc::new(MemoryStore::new());
        session.set("visitor_popup_shown", "true");
        session.set("visitor_popup_timestamp", "garbage");
        let policy = SuppressionStore::new(
            session,
            Arc::new(MemoryStore::new()),
            &DeliveryConfig::default(),
        );

        assert!(policy.is_allowed(Partition::Anonymous, t0()));
    }

    #[test]
    fn test_visit_kind_first_then_returning() {
        let policy = policy();
        assert_eq!(policy.visit_kind(), VisitKind::First);
        assert_eq!(policy.visit_kind(), VisitKind::Returning);
    }
}
