//! Showcase carousel rotation.
//!
//! Much simpler than the popup lifecycle: fetch once, then cycle. The
//! auto-advance interval keeps ticking independently of manual prev/next
//! navigation — resetting it on manual input would be nicer UX but the
//! shipped behavior is kept until that change is confirmed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::model::Advertisement;

/// Cyclic position over a fixed ad list.
pub struct Rotation {
    ads: Vec<Advertisement>,
    index: usize,
}

impl Rotation {
    pub fn new(ads: Vec<Advertisement>) -> Self {
        Self { ads, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Advertisement> {
        self.ads.get(self.index)
    }

    /// Steps forward, wrapping. Used by both the interval and the manual
    /// "next" control.
    pub fn advance(&mut self) {
        if !self.ads.is_empty() {
            self.index = (self.index + 1) % self.ads.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.ads.is_empty() {
            self.index = (self.index + self.ads.len() - 1) % self.ads.len();
        }
    }

    /// Jumps to an indicator position. Out-of-range input is ignored.
    pub fn jump(&mut self, index: usize) {
        if index < self.ads.len() {
            self.index = index;
        }
    }
}

/// Drives the auto-advance interval over a shared [`Rotation`]. Owns the
/// interval task; dropping the rotator aborts it.
pub struct ShowcaseRotator {
    rotation: Arc<Mutex<Rotation>>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ShowcaseRotator {
    pub fn new(ads: Vec<Advertisement>, interval: Duration) -> Self {
        Self {
            rotation: Arc::new(Mutex::new(Rotation::new(ads))),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Shared position, for rendering and manual controls.
    pub fn rotation(&self) -> Arc<Mutex<Rotation>> {
        Arc::clone(&self.rotation)
    }

    /// Starts the auto-advance loop. Only cycles while more than one ad
    /// is loaded. Restarting replaces (aborts) the previous task.
    pub fn start(&self) {
        let rotation = Arc::clone(&self.rotation);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip immediate first tick

            loop {
                ticker.tick().await;
                if let Ok(mut rotation) = rotation.lock() {
                    if rotation.len() > 1 {
                        rotation.advance();
                    }
                }
            }
        });

        if let Ok(mut task) = self.task.lock() {
            if let Some(old) = task.replace(handle) {
                old.abort();
            }
        }
    }

    /// Aborts the auto-advance task. The rotation position stays where
    /// it is and manual controls keep working.
    pub fn stop(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for ShowcaseRotator {
    fn drop(&mut self) {
        self.stop();
    }
}
