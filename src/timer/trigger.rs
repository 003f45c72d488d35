//! Periodic tick sources that drive a countdown

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tracing::{debug, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Returned by a tick callback to keep or detach its trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Break,
}

pub type TickCallback = Box<dyn FnMut() -> TickFlow + Send + 'static>;

/// A scheduler that calls back once per period until stopped
pub trait TickTrigger: Send {
    /// Begin delivering ticks to `on_tick`, replacing any earlier callback
    fn start(&mut self, on_tick: TickCallback);

    /// Stop delivering ticks. Safe to call repeatedly and before `start`.
    fn stop(&mut self);
}

/// Wall-clock trigger backed by a single fixed-period tokio interval
#[derive(Debug)]
pub struct IntervalTrigger {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTrigger {
    /// A zero period is raised to one millisecond, the interval's floor
    pub fn new(period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!("Zero tick period requested, using {:?}", MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        Self { period, handle: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// One tick per second
    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl TickTrigger for IntervalTrigger {
    /// Must be called from within a tokio runtime
    fn start(&mut self, mut on_tick: TickCallback) {
        self.stop();

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            // First tick lands one full period after activation
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if on_tick() == TickFlow::Break {
                    debug!("Interval trigger detached by its callback");
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Interval trigger stopped");
        }
    }
}

impl Drop for IntervalTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
struct ManualSlot {
    running: bool,
    on_tick: Option<TickCallback>,
    delivered: u64,
}

/// Trigger advanced by hand, for simulations and tests
///
/// Clones share the same slot, so a test can keep one handle while the
/// timer owns another.
#[derive(Clone, Default)]
pub struct ManualTrigger {
    slot: Arc<Mutex<ManualSlot>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one tick. Returns false when no callback is attached.
    pub fn fire(&self) -> bool {
        let callback = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if !slot.running {
                return false;
            }
            slot.on_tick.take()
        };

        let Some(mut callback) = callback else {
            return false;
        };

        // The lock is released while the callback runs
        let flow = callback();

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.delivered += 1;
        match flow {
            TickFlow::Continue if slot.running && slot.on_tick.is_none() => {
                slot.on_tick = Some(callback);
            }
            TickFlow::Continue => {}
            TickFlow::Break => slot.running = false,
        }
        true
    }

    /// Deliver up to `count` ticks, stopping early once detached
    pub fn fire_n(&self, count: usize) -> usize {
        (0..count).take_while(|_| self.fire()).count()
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).running
    }

    /// Number of ticks that actually reached a callback
    pub fn delivered(&self) -> u64 {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).delivered
    }
}

impl TickTrigger for ManualTrigger {
    fn start(&mut self, on_tick: TickCallback) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.running = true;
        slot.on_tick = Some(on_tick);
    }

    fn stop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.running = false;
        slot.on_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_callback(counter: Arc<AtomicU32>, stop_at: u32) -> TickCallback {
        Box::new(move || {
            let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= stop_at {
                TickFlow::Break
            } else {
                TickFlow::Continue
            }
        })
    }

    #[test]
    fn test_manual_trigger_delivers_until_break() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut trigger = ManualTrigger::new();
        trigger.start(counting_callback(Arc::clone(&counter), 3));

        assert_eq!(trigger.fire_n(10), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!trigger.is_running());
        assert!(!trigger.fire());
    }

    #[test]
    fn test_manual_trigger_stop_is_idempotent() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut trigger = ManualTrigger::new();
        trigger.stop();
        trigger.start(counting_callback(Arc::clone(&counter), 100));
        trigger.stop();
        trigger.stop();

        assert!(!trigger.fire());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(trigger.delivered(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_fixed_period() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut trigger = IntervalTrigger::every_second();
        trigger.start(counting_callback(Arc::clone(&counter), 100));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        trigger.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!trigger.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_detaches_on_break() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut trigger = IntervalTrigger::every_second();
        trigger.start(counting_callback(Arc::clone(&counter), 2));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!trigger.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut trigger = IntervalTrigger::new(Duration::ZERO);
        assert_eq!(trigger.period(), Duration::from_millis(1));
        trigger.start(counting_callback(Arc::clone(&counter), 3));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!trigger.is_running());
    }
}
