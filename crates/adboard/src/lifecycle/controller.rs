//! Async driver for the popup lifecycle.
//!
//! Checks the frequency-capping policy (before any network work), fetches
//! the ad list, then pumps timer and user events through the pure FSM,
//! executing the effects it emits. Tracking calls are fire-and-forget
//! tasks; their failure is logged and can never block close or
//! navigation.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::fsm::{CloseReason, Effect, Event, PopupFsm, State, TimerKind};
use super::scheduler::TimerScheduler;
use crate::config::DeliveryConfig;
use crate::model::Placement;
use crate::policy::{Partition, SuppressionStore};
use crate::service::AdProvider;

/// How a lifecycle run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The frequency cap denied display; no fetch was performed.
    Suppressed,
    /// Fetch returned no eligible ads (or failed); nothing rendered.
    NoAds,
    /// The popup displayed and closed normally.
    Completed,
}

/// Cheap handle for the presentation layer to feed user input into a
/// running lifecycle.
#[derive(Clone)]
pub struct PopupHandle {
    events: UnboundedSender<Event>,
}

impl PopupHandle {
    /// Requests close. Safe to call repeatedly; the FSM latch makes
    /// concurrent and duplicate requests silent no-ops.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.events.send(Event::CloseRequested(reason));
    }

    /// Click on ad content: tracks the click and opens the outbound link.
    pub fn click_through(&self) {
        let _ = self.events.send(Event::CloseRequested(CloseReason::ClickThrough));
    }
}

/// One popup lifecycle per instance (mirrors one component mount).
pub struct PopupController<P: AdProvider + 'static> {
    provider: Arc<P>,
    policy: Arc<SuppressionStore>,
    config: DeliveryConfig,
    fsm: PopupFsm,
    scheduler: TimerScheduler,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    link_handler: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl<P: AdProvider + 'static> PopupController<P> {
    pub fn new(provider: Arc<P>, policy: Arc<SuppressionStore>, config: DeliveryConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            policy,
            config,
            fsm: PopupFsm::new(),
            scheduler: TimerScheduler::new(),
            events_tx,
            events_rx,
            link_handler: None,
        }
    }

    /// Installs the outbound navigation hook. The host opens the link in
    /// a new `noopener,noreferrer` context.
    pub fn on_open_link<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.link_handler = Some(Box::new(handler));
    }

    pub fn handle(&self) -> PopupHandle {
        PopupHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Runs one full lifecycle to completion.
    pub async fn run(&mut self, partition: Partition) -> RunOutcome {
        let now = Utc::now();
        if !self.policy.is_allowed(partition, now) {
            debug!(?partition, "Popup suppressed by frequency cap, skipping fetch");
            return RunOutcome::Suppressed;
        }

        // First and returning visits currently share the same display
        // delay; the classification is kept so they can diverge again.
        let visit = self.policy.visit_kind();
        debug!(?visit, "Popup approved for display");

        self.fsm.step(Event::FetchStarted);
        let fetch_event = match self.provider.fetch_ads(Placement::Popup).await {
            Ok(ads) => Event::FetchCompleted(ads),
            Err(e) => {
                warn!("Popup ad fetch failed: {} ({})", e, e.user_message());
                Event::FetchFailed
            }
        };
        let effects = self.fsm.step(fetch_event);
        self.apply(effects, partition);

        if self.fsm.state() == State::NoAds {
            return RunOutcome::NoAds;
        }

        // The controller holds a sender, so recv() cannot return None
        // before the lifecycle reaches Idle.
        while let Some(event) = self.events_rx.recv().await {
            let effects = self.fsm.step(event);
            self.apply(effects, partition);
            if self.fsm.state() == State::Idle {
                break;
            }
        }

        RunOutcome::Completed
    }

    fn apply(&mut self, effects: Vec<Effect>, partition: Partition) {
        for effect in effects {
            match effect {
                Effect::ArmTimer(kind) => {
                    self.scheduler
                        .arm(kind, self.duration_for(kind), self.events_tx.clone());
                }
                Effect::CancelAllTimers => self.scheduler.cancel_all(),
                Effect::TrackImpression(ad_id) => {
                    let provider = Arc::clone(&self.provider);
                    tokio::spawn(async move {
                        if let Err(e) = provider.track_impression(&ad_id).await {
                            warn!("Impression tracking failed for ad {}: {}", ad_id, e);
                        }
                    });
                }
                Effect::TrackClick(ad_id) => {
                    let provider = Arc::clone(&self.provider);
                    tokio::spawn(async move {
                        if let Err(e) = provider.track_click(&ad_id).await {
                            warn!("Click tracking failed for ad {}: {}", ad_id, e);
                        }
                    });
                }
                Effect::OpenLink(link) => match &self.link_handler {
                    Some(handler) => handler(&link),
                    None => info!("Outbound link requested: {}", link),
                },
                Effect::MarkShown => self.policy.mark_shown(partition, Utc::now()),
                Effect::ClearAd => debug!("Popup lifecycle finished, ad state cleared"),
            }
        }
    }

    fn duration_for(&self, kind: TimerKind) -> std::time::Duration {
        match kind {
            TimerKind::DisplayDelay => self.config.display_delay(),
            TimerKind::ImpressionGrace => self.config.impression_grace(),
            TimerKind::Countdown => self.config.countdown_start(),
            TimerKind::AutoClose => self.config.auto_close(),
            TimerKind::Cleanup => self.config.cleanup_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::{FetchError, TrackingError};
    use crate::model::{Advertisement, MediaType};

    struct MockProvider {
        ads: Vec<Advertisement>,
        fail_fetch: bool,
        fetches: AtomicUsize,
        impressions: Mutex<Vec<String>>,
        clicks: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn with_ads(ads: Vec<Advertisement>) -> Self {
            Self {
                ads,
                fail_fetch: false,
                fetches: AtomicUsize::new(0),
                impressions: Mutex::new(Vec::new()),
                clicks: Mutex::new(Vec::new()),
            }
        }
    }

    impl AdProvider for MockProvider {
        async fn fetch_ads(&self, _placement: Placement) -> Result<Vec<Advertisement>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(FetchError::Network("connection refused".to_string()));
            }
            Ok(self.ads.clone())
        }

        async fn track_click(&self, ad_id: &str) -> Result<(), TrackingError> {
            self.clicks.lock().unwrap().push(ad_id.to_string());
            Ok(())
        }

        async fn track_impression(&self, ad_id: &str) -> Result<(), TrackingError> {
            self.impressions.lock().unwrap().push(ad_id.to_string());
            Ok(())
        }
    }

    fn popup_ad(id: &str) -> Advertisement {
        Advertisement {
            id: id.to_string(),
            title: "Ad".to_string(),
            content: String::new(),
            media_url: "a.png".to_string(),
            media_type: MediaType::Image,
            link: Some("https://example.com".to_string()),
            position: Placement::Popup,
            is_active: true,
            featured: false,
            clicks: 0,
            impressions: 0,
            created_at: Utc::now(),
        }
    }

    fn policy() -> Arc<SuppressionStore> {
        Arc::new(SuppressionStore::new(
            Arc::new(crate::policy::MemoryStore::new()),
            Arc::new(crate::policy::MemoryStore::new()),
            &DeliveryConfig::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_visit_full_lifecycle() {
        let provider = Arc::new(MockProvider::with_ads(vec![popup_ad("ad-1")]));
        let policy = policy();
        let mut controller = PopupController::new(
            Arc::clone(&provider),
            Arc::clone(&policy),
            DeliveryConfig::default(),
        );

        // Runs through display delay, grace, countdown, auto-close and
        // cleanup; paused time auto-advances through every timer.
        let outcome = controller.run(Partition::Anonymous).await;
        assert_eq!(outcome, RunOutcome::Completed);

        // Let the fire-and-forget tracking task finish.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(*provider.impressions.lock().unwrap(), vec!["ad-1"]);
        assert!(provider.clicks.lock().unwrap().is_empty());

        // Auto-close marked the popup as shown: an immediate reload is
        // suppressed.
        assert!(!policy.is_allowed(Partition::Anonymous, Utc::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppressed_visit_skips_fetch() {
        let provider = Arc::new(MockProvider::with_ads(vec![popup_ad("ad-1")]));
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, Utc::now());

        let mut controller = PopupController::new(
            Arc::clone(&provider),
            Arc::clone(&policy),
            DeliveryConfig::default(),
        );

        let outcome = controller.run(Partition::Anonymous).await;
        assert_eq!(outcome, RunOutcome::Suppressed);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
        assert!(provider.impressions.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partitions_do_not_share_suppression() {
        let provider = Arc::new(MockProvider::with_ads(vec![popup_ad("ad-1")]));
        let policy = policy();
        policy.mark_shown(Partition::Anonymous, Utc::now());

        let mut controller = PopupController::new(
            Arc::clone(&provider),
            Arc::clone(&policy),
            DeliveryConfig::default(),
        );

        // The anonymous visitor just saw the popup, but the user logging
        // in gets their own evaluation.
        let outcome = controller.run(Partition::Authenticated).await;
        assert_eq!(outcome, RunOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ads_renders_nothing() {
        let provider = Arc::new(MockProvider::with_ads(vec![]));
        let mut controller =
            PopupController::new(Arc::clone(&provider), policy(), DeliveryConfig::default());

        let outcome = controller.run(Partition::Anonymous).await;
        assert_eq!(outcome, RunOutcome::NoAds);
        assert!(provider.impressions.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_degrades_to_no_ads() {
        let mut provider = MockProvider::with_ads(vec![popup_ad("ad-1")]);
        provider.fail_fetch = true;
        let provider = Arc::new(provider);
        let policy = policy();

        let mut controller = PopupController::new(
            Arc::clone(&provider),
            Arc::clone(&policy),
            DeliveryConfig::default(),
        );

        let outcome = controller.run(Partition::Anonymous).await;
        assert_eq!(outcome, RunOutcome::NoAds);
        // Nothing was shown, so the window is not burned.
        assert!(policy.is_allowed(Partition::Anonymous, Utc::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_through_tracks_and_opens_link() {
        let provider = Arc::new(MockProvider::with_ads(vec![popup_ad("ad-1")]));
        let policy = policy();
        let mut controller = PopupController::new(
            Arc::clone(&provider),
            Arc::clone(&policy),
            DeliveryConfig::default(),
        );

        let opened: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let opened_clone = Arc::clone(&opened);
        controller.on_open_link(move |link| {
            opened_clone.lock().unwrap().push(link.to_string());
        });

        let handle = controller.handle();
        let task = tokio::spawn(async move { controller.run(Partition::Anonymous).await });

        // Display delay is 1s; click at 1.1s, while visible but before the
        // 1.5s impression grace elapses.
        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;
        handle.click_through();

        let outcome = task.await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(*provider.clicks.lock().unwrap(), vec!["ad-1"]);
        assert_eq!(*opened.lock().unwrap(), vec!["https://example.com"]);
        // Closed before the grace period: no impression for this run.
        assert!(provider.impressions.lock().unwrap().is_empty());
        assert!(!policy.is_allowed(Partition::Anonymous, Utc::now()));
    }
}
