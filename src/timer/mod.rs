//! Card lifecycle timer
//!
//! A single countdown per card session, advanced by an injected tick
//! trigger, that reports expiry to its owner exactly once.

pub mod countdown;
pub mod lifecycle;
pub mod trigger;

pub use countdown::{CountdownSnapshot, CountdownState, SeverityBand, TickOutcome};
pub use lifecycle::{CardLifecycleTimer, ExpiryEvent, ExpiryObserver};
pub use trigger::{IntervalTrigger, ManualTrigger, TickCallback, TickFlow, TickTrigger};
