//! Card lifecycle timer: a countdown, its trigger and a one-shot expiry observer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::TimerError;
use super::{
    countdown::{CountdownSnapshot, CountdownState, SeverityBand, TickOutcome},
    trigger::{TickFlow, TickTrigger},
};

/// Delivered to the owner exactly once, on the tick that reaches zero
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryEvent {
    pub total_seconds: u32,
    pub expired_at: DateTime<Utc>,
}

pub type ExpiryObserver = Box<dyn FnOnce(ExpiryEvent) + Send + 'static>;

struct Lifecycle {
    countdown: CountdownState,
    observer: Option<ExpiryObserver>,
    /// No more ticks are accepted once set (expiry or cancel)
    detached: bool,
}

impl Lifecycle {
    fn advance(&mut self) -> (TickOutcome, Option<ExpiryObserver>) {
        if self.detached {
            return (TickOutcome::Ignored, None);
        }

        let outcome = self.countdown.tick();
        match outcome {
            TickOutcome::Expired => {
                self.detached = true;
                (outcome, self.observer.take())
            }
            TickOutcome::Running { remaining_seconds } => {
                if remaining_seconds % 60 == 0 {
                    debug!("Countdown at {}s of {}s", remaining_seconds, self.countdown.total_seconds());
                }
                (outcome, None)
            }
            TickOutcome::Ignored => (outcome, None),
        }
    }
}

fn lock(shared: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Apply one tick and, if it expired the countdown, notify the observer
/// after the lock has been released.
fn deliver_tick(shared: &Mutex<Lifecycle>) -> TickOutcome {
    let (outcome, observer, total_seconds) = {
        let mut lifecycle = lock(shared);
        let (outcome, observer) = lifecycle.advance();
        (outcome, observer, lifecycle.countdown.total_seconds())
    };

    if let Some(observer) = observer {
        debug!("Countdown of {}s expired, notifying owner", total_seconds);
        observer(ExpiryEvent {
            total_seconds,
            expired_at: Utc::now(),
        });
    }

    outcome
}

/// Tracks elapsed time against a fixed budget and signals expiry once
///
/// The timer owns its trigger. Dropping the timer cancels it, so the trigger
/// is released on every exit path of the owner.
pub struct CardLifecycleTimer<T: TickTrigger> {
    shared: Arc<Mutex<Lifecycle>>,
    trigger: T,
    activated: bool,
}

impl<T: TickTrigger> CardLifecycleTimer<T> {
    /// Build a timer with the full budget remaining. Nothing ticks until
    /// [`activate`](Self::activate) is called.
    pub fn create<F>(total_seconds: i64, trigger: T, on_expired: F) -> Result<Self, TimerError>
    where
        F: FnOnce(ExpiryEvent) + Send + 'static,
    {
        let countdown = CountdownState::new(total_seconds)?;

        Ok(Self {
            shared: Arc::new(Mutex::new(Lifecycle {
                countdown,
                observer: Some(Box::new(on_expired)),
                detached: false,
            })),
            trigger,
            activated: false,
        })
    }

    /// Attach the trigger. Later calls, or calls after cancel, do nothing.
    pub fn activate(&mut self) {
        if self.activated || lock(&self.shared).detached {
            return;
        }
        self.activated = true;

        let shared = Arc::clone(&self.shared);
        self.trigger.start(Box::new(move || match deliver_tick(&shared) {
            TickOutcome::Running { .. } => TickFlow::Continue,
            TickOutcome::Expired | TickOutcome::Ignored => TickFlow::Break,
        }));
    }

    /// Deliver one tick directly, bypassing the trigger
    pub fn tick(&self) -> TickOutcome {
        deliver_tick(&self.shared)
    }

    /// Stop tick delivery. Leaves the countdown as it is.
    pub fn cancel(&mut self) {
        {
            let mut lifecycle = lock(&self.shared);
            lifecycle.detached = true;
            lifecycle.observer = None;
        }
        self.trigger.stop();
    }

    pub fn progress(&self) -> f64 {
        lock(&self.shared).countdown.progress()
    }

    pub fn severity(&self) -> SeverityBand {
        lock(&self.shared).countdown.severity()
    }

    pub fn remaining_seconds(&self) -> u32 {
        lock(&self.shared).countdown.remaining_seconds()
    }

    pub fn is_expired(&self) -> bool {
        lock(&self.shared).countdown.is_expired()
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        lock(&self.shared).countdown.snapshot()
    }
}

impl<T: TickTrigger> Drop for CardLifecycleTimer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTrigger;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_timer(total: i64) -> (CardLifecycleTimer<ManualTrigger>, ManualTrigger, Arc<AtomicU32>) {
        let fired = Arc::new(AtomicU32::new(0));
        let observer_count = Arc::clone(&fired);
        let trigger = ManualTrigger::new();
        let timer = CardLifecycleTimer::create(total, trigger.clone(), move |_| {
            observer_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (timer, trigger, fired)
    }

    #[test]
    fn test_create_validates_duration() {
        let result = CardLifecycleTimer::create(0, ManualTrigger::new(), |_| {});
        assert_eq!(result.err(), Some(TimerError::InvalidDuration(0)));

        let result = CardLifecycleTimer::create(-5, ManualTrigger::new(), |_| {});
        assert_eq!(result.err(), Some(TimerError::InvalidDuration(-5)));

        let timer = CardLifecycleTimer::create(600, ManualTrigger::new(), |_| {}).unwrap();
        assert_eq!(timer.remaining_seconds(), 600);
        assert!(!timer.is_expired());
    }

    #[test]
    fn test_nothing_ticks_before_activate() {
        let (timer, trigger, _) = counting_timer(5);
        assert!(!trigger.fire());
        assert_eq!(timer.remaining_seconds(), 5);
    }

    #[test]
    fn test_counts_down_through_trigger() {
        let (mut timer, trigger, fired) = counting_timer(10);
        timer.activate();

        for n in 1..10u32 {
            assert!(trigger.fire());
            assert_eq!(timer.remaining_seconds(), 10 - n);
            assert!(!timer.is_expired());
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_expiry_fires_once_and_detaches() {
        let (mut timer, trigger, fired) = counting_timer(3);
        timer.activate();

        assert_eq!(trigger.fire_n(10), 3);
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.is_expired());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!trigger.is_running());

        for _ in 0..5 {
            assert_eq!(timer.tick(), TickOutcome::Ignored);
        }
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.is_expired());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_direct_ticks_expire_once() {
        let (timer, _, fired) = counting_timer(2);
        assert_eq!(timer.tick(), TickOutcome::Running { remaining_seconds: 1 });
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(timer.tick(), TickOutcome::Ignored);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_before_first_tick_blocks_observation() {
        let (mut timer, trigger, fired) = counting_timer(1);
        timer.activate();
        timer.cancel();

        // A tick racing with teardown
        assert!(!trigger.fire());
        assert_eq!(timer.tick(), TickOutcome::Ignored);

        assert_eq!(timer.remaining_seconds(), 1);
        assert!(!timer.is_expired());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(trigger.delivered(), 0);
    }

    #[test]
    fn test_cancel_is_idempotent_and_keeps_state() {
        let (mut timer, trigger, _) = counting_timer(10);
        timer.activate();
        trigger.fire_n(4);

        timer.cancel();
        timer.cancel();
        assert_eq!(timer.remaining_seconds(), 6);
        assert!(!timer.is_expired());

        timer.activate();
        assert!(!trigger.fire());
        assert_eq!(timer.remaining_seconds(), 6);
    }

    #[test]
    fn test_cancel_after_expiry_is_allowed() {
        let (mut timer, trigger, fired) = counting_timer(1);
        timer.activate();
        trigger.fire();
        timer.cancel();

        assert!(timer.is_expired());
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_tick_from_observer_is_ignored() {
        let reentrant = Arc::new(Mutex::new(None::<Arc<Mutex<Lifecycle>>>));
        let outcomes = Arc::new(Mutex::new(Vec::new()));

        let slot = Arc::clone(&reentrant);
        let seen = Arc::clone(&outcomes);
        let mut timer = CardLifecycleTimer::create(1, ManualTrigger::new(), move |_| {
            if let Some(shared) = slot.lock().unwrap().as_ref() {
                seen.lock().unwrap().push(deliver_tick(shared));
            }
        })
        .unwrap();
        *reentrant.lock().unwrap() = Some(Arc::clone(&timer.shared));

        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(*outcomes.lock().unwrap(), vec![TickOutcome::Ignored]);
        assert_eq!(timer.remaining_seconds(), 0);

        timer.cancel();
        *reentrant.lock().unwrap() = None;
    }

    #[test]
    fn test_snapshot_reads_live_state() {
        let (mut timer, trigger, _) = counting_timer(4);
        timer.activate();
        trigger.fire_n(3);

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.remaining_seconds, 1);
        assert_eq!(snapshot.severity, SeverityBand::Warning);
        assert!(!snapshot.expired);

        trigger.fire();
        assert!(timer.snapshot().expired);
    }

    #[test]
    fn test_progress_and_severity_follow_ticks() {
        let (mut timer, trigger, _) = counting_timer(600);
        timer.activate();

        let mut last = timer.progress();
        assert_eq!(timer.severity(), SeverityBand::Safe);

        trigger.fire_n(299);
        assert_eq!(timer.remaining_seconds(), 301);
        assert_eq!(timer.severity(), SeverityBand::Safe);

        trigger.fire();
        assert_eq!(timer.progress(), 0.5);
        assert_eq!(timer.severity(), SeverityBand::Warning);

        trigger.fire_n(180);
        assert_eq!(timer.remaining_seconds(), 120);
        assert_eq!(timer.severity(), SeverityBand::Critical);

        while trigger.fire() {
            let progress = timer.progress();
            assert!(progress <= last);
            last = progress;
        }
        assert!(timer.is_expired());
    }

    #[test]
    fn test_drop_releases_trigger() {
        let (mut timer, trigger, fired) = counting_timer(2);
        timer.activate();
        assert!(trigger.is_running());

        drop(timer);
        assert!(!trigger.is_running());
        assert!(!trigger.fire());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
