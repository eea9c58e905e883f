//! External control over a running generation: cooperative stop and tick pacing.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

/// Cooperative stop request, polled once at the start of every tick.
pub trait StopSignal {
    fn should_stop(&self) -> bool;
}

/// A stop signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

impl StopSignal for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T> StopSignal for &T
where
    T: StopSignal + ?Sized,
{
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}

impl<T> StopSignal for Arc<T>
where
    T: StopSignal + ?Sized,
{
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}

/// Controls wall-clock pacing between ticks.
///
/// Pacing never changes the simulation, only how fast it runs.
pub trait Pacer {
    /// Called once before the first tick.
    fn start(&mut self) {}

    /// Called after each tick; blocks until the next one is due.
    fn wait_next_tick(&mut self);
}

/// Runs ticks back to back as fast as possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn wait_next_tick(&mut self) {}
}

/// Runs ticks at a fixed rate per second.
///
/// Deadlines are absolute, so a slow tick is caught up on the next one instead of
/// accumulating drift.
#[derive(Debug, Clone)]
pub struct FixedRate {
    period: Duration,
    next_deadline: Option<Instant>,
}

impl FixedRate {
    /// # Panics
    ///
    /// Panics if `tick_rate` is zero.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        assert!(tick_rate > 0, "tick rate must be positive");
        Self {
            period: Duration::from_secs(1) / tick_rate,
            next_deadline: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Pacer for FixedRate {
    fn start(&mut self) {
        self.next_deadline = Some(Instant::now() + self.period);
    }

    fn wait_next_tick(&mut self) {
        let now = Instant::now();
        let deadline = *self.next_deadline.get_or_insert(now + self.period);
        if deadline > now {
            thread::sleep(deadline - now);
            self.next_deadline = Some(deadline + self.period);
        } else {
            // fell behind by more than a tick; restart the schedule from now
            self.next_deadline = Some(now + self.period);
        }
    }
}
