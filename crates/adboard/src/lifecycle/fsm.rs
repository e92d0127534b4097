//! Popup lifecycle state machine.
//!
//! Pure and synchronous: the driver feeds [`Event`]s in and executes the
//! returned [`Effect`]s (arming timers, tracking, storage writes). All
//! timing and I/O lives outside, which is what makes close idempotence
//! and impression-once provable in unit tests.
//!
//! States: `Idle → Fetching → (NoAds | Scheduled) → Visible → Closing → Idle`.
//! Events that are illegal in the current state are silent no-ops.

use crate::model::Advertisement;

/// Timers the driver owns on the FSM's behalf. Leaving the visible
/// portion of the lifecycle cancels all of them at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Scheduled → Visible, after the page has visually settled.
    DisplayDelay,
    /// Visible → impression counted, unless closed first.
    ImpressionGrace,
    /// Visible → countdown indicator appears (final seconds).
    Countdown,
    /// Visible → automatic close.
    AutoClose,
    /// Closing → Idle, after the close animation.
    Cleanup,
}

/// What triggered the close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Button,
    /// Click on the overlay background itself (the presentation layer is
    /// responsible for ignoring bubbled clicks from inner content).
    Overlay,
    /// Click on ad content or its call to action.
    ClickThrough,
    AutoClose,
    Escape,
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    FetchStarted,
    /// Ad list arrived, already filtered to active and ordered
    /// featured-then-newest by the store.
    FetchCompleted(Vec<Advertisement>),
    FetchFailed,
    DisplayDelayElapsed,
    ImpressionGraceElapsed,
    CountdownElapsed,
    AutoCloseElapsed,
    CloseRequested(CloseReason),
    CleanupElapsed,
}

/// Outputs the driver must execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ArmTimer(TimerKind),
    CancelAllTimers,
    /// Fire-and-forget click tracking; must never block `OpenLink`.
    TrackClick(String),
    /// Fire-and-forget impression tracking. Emitted at most once per
    /// lifecycle and never after the ad has been replaced.
    TrackImpression(String),
    /// Outbound navigation (new `noopener,noreferrer` context).
    OpenLink(String),
    /// Update the suppression policy: the popup was shown and closed.
    MarkShown,
    ClearAd,
}

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Fetching,
    /// Terminal for this mount: nothing to show.
    NoAds,
    Scheduled,
    Visible,
    Closing,
}

/// The popup state machine. One instance per popup mount.
pub struct PopupFsm {
    state: State,
    ad: Option<Advertisement>,
    impression_tracked: bool,
    countdown_visible: bool,
}

impl Default for PopupFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupFsm {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            ad: None,
            impression_tracked: false,
            countdown_visible: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The ad currently owned by the lifecycle, if any.
    pub fn ad(&self) -> Option<&Advertisement> {
        self.ad.as_ref()
    }

    /// Whether the auto-close countdown indicator should render.
    pub fn countdown_visible(&self) -> bool {
        self.countdown_visible
    }

    /// Advances the machine. Returns the effects the driver must run.
    pub fn step(&mut self, event: Event) -> Vec<Effect> {
        match (self.state, event) {
            // Fetch is triggered once per mount; repeats are ignored.
            (State::Idle, Event::FetchStarted) => {
                self.state = State::Fetching;
                vec![]
            }

            (State::Fetching, Event::FetchCompleted(ads)) => {
                match ads.into_iter().find(|ad| ad.is_active) {
                    Some(ad) => {
                        self.ad = Some(ad);
                        self.state = State::Scheduled;
                        vec![Effect::ArmTimer(TimerKind::DisplayDelay)]
                    }
                    None => {
                        self.state = State::NoAds;
                        vec![]
                    }
                }
            }

            // A failed fetch renders nothing; the popup never blocks the page.
            (State::Fetching, Event::FetchFailed) => {
                self.state = State::NoAds;
                vec![]
            }

            (State::Scheduled, Event::DisplayDelayElapsed) => {
                self.state = State::Visible;
                vec![
                    Effect::ArmTimer(TimerKind::AutoClose),
                    Effect::ArmTimer(TimerKind::Countdown),
                    Effect::ArmTimer(TimerKind::ImpressionGrace),
                ]
            }

            // Unmount-while-scheduled: cancel and clean up without marking
            // the policy — the popup was never actually displayed.
            (State::Scheduled, Event::CloseRequested(_)) => {
                self.state = State::Closing;
                vec![
                    Effect::CancelAllTimers,
                    Effect::ArmTimer(TimerKind::Cleanup),
                ]
            }

            (State::Visible, Event::ImpressionGraceElapsed) => {
                if self.impression_tracked {
                    return vec![];
                }
                self.impression_tracked = true;
                match &self.ad {
                    Some(ad) => vec![Effect::TrackImpression(ad.id.clone())],
                    None => vec![],
                }
            }

            (State::Visible, Event::CountdownElapsed) => {
                self.countdown_visible = true;
                vec![]
            }

            (State::Visible, Event::AutoCloseElapsed) => {
                self.close(CloseReason::AutoClose)
            }

            (State::Visible, Event::CloseRequested(reason)) => self.close(reason),

            (State::Closing, Event::CleanupElapsed) => {
                self.state = State::Idle;
                self.ad = None;
                self.impression_tracked = false;
                self.countdown_visible = false;
                vec![Effect::ClearAd]
            }

            // The latch: any further close request while closing is a
            // silent no-op, so cleanup side effects run exactly once.
            (State::Closing, Event::CloseRequested(_)) => vec![],

            // Everything else (stale timer fires after close, duplicate
            // fetch triggers, events in terminal states) is a no-op.
            _ => vec![],
        }
    }

    fn close(&mut self, reason: CloseReason) -> Vec<Effect> {
        self.state = State::Closing;

        let mut effects = Vec::new();
        // Click-through tracks, then navigates; tracking failure must not
        // stop the navigation, which is why these are separate effects.
        if reason == CloseReason::ClickThrough {
            if let Some(ad) = &self.ad {
                effects.push(Effect::TrackClick(ad.id.clone()));
                if let Some(link) = &ad.link {
                    effects.push(Effect::OpenLink(link.clone()));
                }
            }
        }
        effects.push(Effect::CancelAllTimers);
        effects.push(Effect::MarkShown);
        effects.push(Effect::ArmTimer(TimerKind::Cleanup));
        effects
    }
}
