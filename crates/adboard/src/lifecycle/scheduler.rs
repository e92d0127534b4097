//! Named cancellable timers for the popup lifecycle.
//!
//! Each [`TimerKind`] owns at most one pending task; arming a kind again
//! replaces (aborts) the previous task, and `cancel_all` is a single
//! structural operation rather than an enumerated cleanup list. A timer
//! that loses the cancellation race still cannot corrupt state: its event
//! lands in the FSM, which treats stale fires as no-ops.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::fsm::{Event, TimerKind};

impl TimerKind {
    /// The event this timer delivers when it fires.
    pub fn event(self) -> Event {
        match self {
            TimerKind::DisplayDelay => Event::DisplayDelayElapsed,
            TimerKind::ImpressionGrace => Event::ImpressionGraceElapsed,
            TimerKind::Countdown => Event::CountdownElapsed,
            TimerKind::AutoClose => Event::AutoCloseElapsed,
            TimerKind::Cleanup => Event::CleanupElapsed,
        }
    }
}

/// Owns the lifecycle's pending timers.
#[derive(Default)]
pub struct TimerScheduler {
    timers: Mutex<HashMap<TimerKind, JoinHandle<()>>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer that sends `kind.event()` after `delay`. Re-arming a
    /// kind aborts the previous task for that kind.
    pub fn arm(&self, kind: TimerKind, delay: Duration, events: UnboundedSender<Event>) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the lifecycle already ended.
            let _ = events.send(kind.event());
        });

        if let Ok(mut timers) = self.timers.lock() {
            if let Some(old) = timers.insert(kind, handle) {
                old.abort();
            }
        }
    }

    /// Aborts every pending timer.
    pub fn cancel_all(&self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
