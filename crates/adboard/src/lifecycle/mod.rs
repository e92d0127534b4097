//! Popup and showcase delivery lifecycles.

pub mod controller;
pub mod fsm;
pub mod rotation;
pub mod scheduler;

pub use controller::{PopupController, PopupHandle, RunOutcome};
pub use fsm::{CloseReason, Effect, Event, PopupFsm, State, TimerKind};
pub use rotation::{Rotation, ShowcaseRotator};
pub use scheduler::TimerScheduler;
