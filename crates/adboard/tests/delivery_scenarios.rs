//! End-to-end delivery scenarios over the real store: policy gate →
//! fetch → popup lifecycle → counters and ledgers.

mod common;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use adboard::db::{ad_repo, Database};
use adboard::{
    AdService, DeliveryConfig, MemoryStore, Partition, Placement, PopupController, RunOutcome,
    SuppressionStore,
};
use common::builders::AdBuilder;

fn policy() -> Arc<SuppressionStore> {
    Arc::new(SuppressionStore::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        &DeliveryConfig::default(),
    ))
}

#[tokio::test(start_paused = true)]
async fn fresh_visitor_sees_popup_and_impression_is_counted_once() {
    let db = Database::open_in_memory().unwrap();
    ad_repo::insert(&db, &AdBuilder::new("promo").build()).unwrap();

    let service = Arc::new(AdService::new(db.clone(), "sess-1"));
    let policy = policy();
    let mut controller = PopupController::new(
        Arc::clone(&service),
        Arc::clone(&policy),
        DeliveryConfig::default(),
    );

    let outcome = controller.run(Partition::Anonymous).await;
    assert_eq!(outcome, RunOutcome::Completed);

    // Let the fire-and-forget impression task reach the store.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    let ad = ad_repo::find_by_id(&db, "promo").unwrap().unwrap();
    assert_eq!(ad.impressions, 1);
    assert_eq!(ad.clicks, 0);

    // The close marked the partition as shown.
    assert!(!policy.is_allowed(Partition::Anonymous, Utc::now()));
}

#[tokio::test(start_paused = true)]
async fn suppressed_repeat_visit_fetches_nothing() {
    let db = Database::open_in_memory().unwrap();
    ad_repo::insert(&db, &AdBuilder::new("promo").build()).unwrap();

    let service = Arc::new(AdService::new(db.clone(), "sess-1"));
    let policy = policy();

    // First run displays and closes.
    let mut first = PopupController::new(
        Arc::clone(&service),
        Arc::clone(&policy),
        DeliveryConfig::default(),
    );
    assert_eq!(first.run(Partition::Anonymous).await, RunOutcome::Completed);
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    // Reload in the same session: denied before any fetch, and the
    // impression count stays where it was.
    let mut second = PopupController::new(
        Arc::clone(&service),
        Arc::clone(&policy),
        DeliveryConfig::default(),
    );
    assert_eq!(second.run(Partition::Anonymous).await, RunOutcome::Suppressed);

    let ad = ad_repo::find_by_id(&db, "promo").unwrap().unwrap();
    assert_eq!(ad.impressions, 1);
}

#[tokio::test(start_paused = true)]
async fn same_session_redisplay_within_the_hour_does_not_double_count() {
    let db = Database::open_in_memory().unwrap();
    ad_repo::insert(&db, &AdBuilder::new("promo").build()).unwrap();

    let service = Arc::new(AdService::new(db.clone(), "sess-1"));

    // Two full lifecycles with independent (fresh) policies, simulating a
    // client that lost its session flags. The server-side impression
    // ledger still dedups within the hour bucket.
    for _ in 0..2 {
        let mut controller = PopupController::new(
            Arc::clone(&service),
            policy(),
            DeliveryConfig::default(),
        );
        assert_eq!(controller.run(Partition::Anonymous).await, RunOutcome::Completed);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    let ad = ad_repo::find_by_id(&db, "promo").unwrap().unwrap();
    assert_eq!(ad.impressions, 1);
}

#[test]
fn frequency_cap_window_boundaries() {
    let policy = policy();
    let shown_at = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
    policy.mark_shown(Partition::Anonymous, shown_at);

    assert!(!policy.is_allowed(Partition::Anonymous, shown_at + ChronoDuration::minutes(59)));
    assert!(policy.is_allowed(Partition::Anonymous, shown_at + ChronoDuration::minutes(61)));
}

#[test]
fn view_ledger_is_idempotent_across_accounts_and_retries() {
    let db = Database::open_in_memory().unwrap();
    let service = AdService::new(db, "sess-1");
    let now = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();

    assert!(service.record_view("u1", "job-7", "one@ex.com", now).unwrap());
    // Same user again: already counted, reported as success.
    assert!(!service.record_view("u1", "job-7", "one@ex.com", now).unwrap());
    // Account switch with the same email: also already counted.
    assert!(!service.record_view("u2", "job-7", "one@ex.com", now).unwrap());

    assert_eq!(service.count_views("job-7").unwrap(), 1);
}

#[test]
fn list_active_excludes_inactive_and_orders_featured_first() {
    let db = Database::open_in_memory().unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

    ad_repo::insert(
        &db,
        &AdBuilder::new("hidden").inactive().featured().build(),
    )
    .unwrap();
    ad_repo::insert(&db, &AdBuilder::new("recent").created_at(t1).build()).unwrap();
    ad_repo::insert(
        &db,
        &AdBuilder::new("starred").featured().created_at(t0).build(),
    )
    .unwrap();

    let service = AdService::new(db, "sess-1");
    let ads = service.list_active(Placement::Popup).unwrap();
    let ids: Vec<&str> = ads.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["starred", "recent"]);
}
